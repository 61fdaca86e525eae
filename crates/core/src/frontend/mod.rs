//! Source tree loading.
//!
//! Walks the input directory in a deterministic order and parses every Go
//! file into the parser-independent [`crate::syntax`] model.

mod go;

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::FrontendError;
use crate::syntax::SourceFile;

pub use go::GoParser;

/// Directory names never descended into.
const IGNORED_DIRS: &[&str] = &["vendor", "testdata", "node_modules"];

/// Parse every non-test `.go` file under `input_dir`, sorted by path.
///
/// `module_root` is the directory holding `go.mod`; every file must live
/// below it. Directories listed in `skip` (generated output, the runtime
/// package) are left out entirely.
pub fn load_tree(input_dir: &Path, module_root: &Path, skip: &[PathBuf]) -> Result<Vec<SourceFile>, FrontendError> {
    let mut parser = GoParser::new()?;
    let mut files = Vec::new();

    let walker = WalkDir::new(input_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry, skip));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_go_source(entry.path()) {
            continue;
        }

        let path = entry.path();
        let rel_dir = relative_dir(path, module_root)?;
        let source = fs::read_to_string(path).map_err(|source| FrontendError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let file = parser.parse(path, &rel_dir, &source)?;
        debug!(
            path = %path.display(),
            unit = %file.unit,
            functions = file.functions.len(),
            "Parsed source file."
        );
        files.push(file);
    }

    info!(dir = %input_dir.display(), files = files.len(), "Loaded source tree.");
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry, skip: &[PathBuf]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    if skip.iter().any(|dir| dir == entry.path()) {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name.starts_with('_') || IGNORED_DIRS.contains(&name.as_ref())
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('.')
        && !name.starts_with('_')
}

/// Directory of `path` relative to `module_root`, `/`-separated.
fn relative_dir(path: &Path, module_root: &Path) -> Result<String, FrontendError> {
    let dir = path.parent().unwrap_or(path);
    let rel = dir
        .strip_prefix(module_root)
        .map_err(|_| FrontendError::OutsideModule {
            path: path.to_path_buf(),
            root: module_root.to_path_buf(),
        })?;

    let segments: Vec<String> = rel
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Ok(segments.join("/"))
}
