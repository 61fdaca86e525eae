//! Module manifest (`go.mod`) handling: the module identifier, the `replace`
//! directive pointing at the runtime package, and `go mod tidy`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::codegen::{MIN_GO_VERSION, RuntimePackage};
use crate::error::ManifestError;

/// Either `replace vertex => ./vertex` or the same mapping inside a `replace (...)` block.
#[allow(clippy::expect_used)]
static REPLACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:replace\s+)?vertex\s*=>\s*\./vertex\b").expect("valid replace regex")
});

fn replace_directive() -> String {
    format!("replace {0} => ./{0}", RuntimePackage::DIR)
}

fn read(path: &Path) -> Result<String, ManifestError> {
    fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Module identifier declared by the manifest at `path`.
pub fn read_module(path: &Path) -> Result<String, ManifestError> {
    let content = read(path)?;
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("module "))
        .map(|rest| rest.trim().to_string())
        .ok_or_else(|| ManifestError::MissingModule {
            path: path.to_path_buf(),
        })
}

/// Value of the `go` directive, if the manifest has one.
pub fn go_version(content: &str) -> Option<&str> {
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("go "))
        .map(str::trim)
}

/// Whether `version` is at least `minimum`, comparing numeric components.
fn version_at_least(version: &str, minimum: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.split(['.', '-', 'r', 'c'])
            .filter(|part| !part.is_empty())
            .map_while(|part| part.parse().ok())
            .collect()
    };
    parse(version) >= parse(minimum)
}

/// Warn when the manifest targets a Go release older than the generated code needs.
pub fn check_go_version(path: &Path) -> Result<(), ManifestError> {
    let content = read(path)?;
    match go_version(&content) {
        Some(version) if !version_at_least(version, MIN_GO_VERSION) => warn!(
            "{} declares go {}, generated code needs go {} or newer",
            path.display(),
            version,
            MIN_GO_VERSION
        ),
        Some(_) => {}
        None => debug!("{} has no go directive", path.display()),
    }
    Ok(())
}

/// Append the runtime `replace` directive unless it is already present.
///
/// Returns whether the file was changed.
pub fn ensure_replace(path: &Path) -> Result<bool, ManifestError> {
    let content = read(path)?;
    if REPLACE_RE.is_match(&content) {
        debug!("{} already replaces the runtime package", path.display());
        return Ok(false);
    }

    let io_err = |source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::OpenOptions::new().append(true).open(path).map_err(io_err)?;

    let mut addition = String::new();
    if !content.is_empty() && !content.ends_with('\n') {
        addition.push('\n');
    }
    addition.push('\n');
    addition.push_str(&replace_directive());
    addition.push('\n');
    file.write_all(addition.as_bytes()).map_err(io_err)?;

    info!("Added `{}` to {}", replace_directive(), path.display());
    Ok(true)
}

/// Run `go mod tidy` next to the manifest.
pub fn tidy(path: &Path) -> Result<(), ManifestError> {
    let go = which::which("go")?;
    let dir = path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    debug!("Running go mod tidy in {}", dir.display());
    let output = Command::new(go)
        .args(["mod", "tidy"])
        .current_dir(&dir)
        .output()
        .map_err(|source| ManifestError::Io {
            path: dir.clone(),
            source,
        })?;

    if !output.status.success() {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(ManifestError::Tidy {
            dir,
            status: output.status.to_string(),
            output: combined.trim().to_string(),
        });
    }
    info!("go mod tidy completed");
    Ok(())
}
