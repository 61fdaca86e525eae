//! Compile configuration.
//!
//! Resolved from three layers, lowest precedence first: built-in defaults,
//! an optional `vertex.toml` in the input directory, and caller overrides
//! (the CLI flags).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::codegen::{RuntimePackage, is_go_identifier};
use crate::error::ConfigError;

/// Config file looked up in the input directory
pub const CONFIG_FILENAME: &str = "vertex.toml";

const DEFAULT_OUTPUT_DIR: &str = "generated";
const DEFAULT_CLIENT_PACKAGE: &str = "client";
const DEFAULT_PORT: u16 = 8080;
const MANIFEST_FILENAME: &str = "go.mod";

/// One optional layer of settings, as read from `vertex.toml` or given as overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Output directory for the artifacts
    pub output: Option<PathBuf>,
    /// Client package name
    pub client_package: Option<String>,
    /// Path to `go.mod`
    pub manifest: Option<PathBuf>,
    /// Default listen port of the server
    pub port: Option<u16>,
    /// Default endpoint of the client
    pub endpoint: Option<String>,
    /// Run `gofmt` on the artifacts
    pub format: Option<bool>,
    /// Run `go mod tidy` afterwards
    pub tidy: Option<bool>,
    /// Maintain the runtime `replace` directive
    pub manage_manifest: Option<bool>,
    /// Where to dump the IR bundle
    pub emit_ir: Option<PathBuf>,
}

impl ConfigFile {
    /// Load `vertex.toml` from `dir`, or an empty layer when there is none.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILENAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let layer: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        debug!("Loaded {}", path.display());
        Ok(layer.rebase(dir))
    }

    /// Resolve relative paths of this layer against `base`.
    fn rebase(self, base: &Path) -> Self {
        let join = |path: Option<PathBuf>| path.map(|p| base.join(p));
        Self {
            output: join(self.output),
            manifest: join(self.manifest),
            emit_ir: join(self.emit_ir),
            ..self
        }
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            output: other.output.or(self.output),
            client_package: other.client_package.or(self.client_package),
            manifest: other.manifest.or(self.manifest),
            port: other.port.or(self.port),
            endpoint: other.endpoint.or(self.endpoint),
            format: other.format.or(self.format),
            tidy: other.tidy.or(self.tidy),
            manage_manifest: other.manage_manifest.or(self.manage_manifest),
            emit_ir: other.emit_ir.or(self.emit_ir),
        }
    }
}

/// Fully resolved settings of one compile run. All paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory scanned for Go sources
    pub input_dir: PathBuf,
    /// Directory the artifacts are written under
    pub output_dir: PathBuf,
    /// Package name of the client artifact
    pub client_package: String,
    /// Path to `go.mod`
    pub manifest_path: PathBuf,
    /// Default listen port of the server
    pub port: u16,
    /// Default endpoint of the client
    pub endpoint: String,
    /// Run generated code through `gofmt`
    pub format: bool,
    /// Run `go mod tidy` after writing
    pub tidy: bool,
    /// Add the runtime `replace` directive to the manifest
    pub manage_manifest: bool,
    /// Where to dump the IR bundle as JSON
    pub emit_ir: Option<PathBuf>,
}

impl Config {
    /// Resolve the configuration for `input_dir`, applying `overrides` last.
    ///
    /// Relative paths in `vertex.toml` are relative to the input directory,
    /// relative override paths to the working directory.
    pub fn resolve(input_dir: &Path, overrides: ConfigFile) -> Result<Self, ConfigError> {
        let input_dir = absolute(input_dir)?;
        let overrides = ConfigFile {
            output: overrides.output.as_deref().map(absolute).transpose()?,
            manifest: overrides.manifest.as_deref().map(absolute).transpose()?,
            emit_ir: overrides.emit_ir.as_deref().map(absolute).transpose()?,
            ..overrides
        };
        let layer = ConfigFile::load(&input_dir)?.merge(overrides);

        let port = layer.port.unwrap_or(DEFAULT_PORT);
        let config = Self {
            output_dir: layer
                .output
                .unwrap_or_else(|| input_dir.join(DEFAULT_OUTPUT_DIR)),
            client_package: layer
                .client_package
                .unwrap_or_else(|| DEFAULT_CLIENT_PACKAGE.to_string()),
            manifest_path: layer
                .manifest
                .unwrap_or_else(|| input_dir.join(MANIFEST_FILENAME)),
            port,
            endpoint: layer
                .endpoint
                .unwrap_or_else(|| format!("http://localhost:{port}")),
            format: layer.format.unwrap_or(true),
            tidy: layer.tidy.unwrap_or(true),
            manage_manifest: layer.manage_manifest.unwrap_or(true),
            emit_ir: layer.emit_ir,
            input_dir,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !is_go_identifier(&self.client_package) {
            return Err(ConfigError::Invalid {
                field: "client_package",
                reason: format!("{:?} is not a Go package name", self.client_package),
            });
        }
        if self.client_package == "main" || self.client_package == RuntimePackage::DIR {
            return Err(ConfigError::Invalid {
                field: "client_package",
                reason: format!("{:?} is reserved", self.client_package),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid {
                field: "port",
                reason: "must be between 1 and 65535".to_string(),
            });
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "endpoint",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Directory holding the manifest; the runtime package lives under it.
    pub fn module_root(&self) -> &Path {
        self.manifest_path.parent().unwrap_or(&self.input_dir)
    }

    /// Where the runtime package is written.
    pub fn runtime_dir(&self) -> PathBuf {
        self.module_root().join(RuntimePackage::DIR)
    }

    /// Where the server artifact is written.
    pub fn server_path(&self) -> PathBuf {
        self.output_dir.join("server").join("server.go")
    }

    /// Where the client artifact is written.
    pub fn client_path(&self) -> PathBuf {
        self.output_dir
            .join(&self.client_package)
            .join("client.go")
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path).map_err(|source| ConfigError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::resolve(dir.path(), ConfigFile::default()).unwrap();

        let root = std::path::absolute(dir.path()).unwrap();
        assert_eq!(config.input_dir, root);
        assert_eq!(config.output_dir, root.join("generated"));
        assert_eq!(config.manifest_path, root.join("go.mod"));
        assert_eq!(config.client_package, "client");
        assert_eq!(config.port, 8080);
        assert_eq!(config.endpoint, "http://localhost:8080");
        assert!(config.format && config.tidy && config.manage_manifest);
        assert_eq!(config.emit_ir, None);
        assert_eq!(config.server_path(), root.join("generated/server/server.go"));
        assert_eq!(config.client_path(), root.join("generated/client/client.go"));
        assert_eq!(config.runtime_dir(), root.join("vertex"));
    }

    #[test]
    fn test_file_then_overrides() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            "output = \"out\"\nclient_package = \"shopapi\"\nport = 9090\ntidy = false\n",
        )
        .unwrap();

        let overrides = ConfigFile {
            port: Some(7070),
            format: Some(false),
            ..ConfigFile::default()
        };
        let config = Config::resolve(dir.path(), overrides).unwrap();

        let root = std::path::absolute(dir.path()).unwrap();
        assert_eq!(config.output_dir, root.join("out"));
        assert_eq!(config.client_package, "shopapi");
        assert_eq!(config.port, 7070);
        assert_eq!(config.endpoint, "http://localhost:7070");
        assert!(!config.tidy);
        assert!(!config.format);
        assert_eq!(config.client_path(), root.join("out/shopapi/client.go"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "outptu = \"x\"\n").unwrap();
        let err = Config::resolve(dir.path(), ConfigFile::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        for (package, port) in [("my-client", 8080), ("func", 8080), ("main", 8080), ("client", 0)] {
            let overrides = ConfigFile {
                client_package: Some(package.to_string()),
                port: Some(port),
                ..ConfigFile::default()
            };
            let err = Config::resolve(dir.path(), overrides).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{package} {port}");
        }
    }

    #[test]
    fn test_merge_prefers_later_layer() {
        let base = ConfigFile {
            port: Some(1),
            endpoint: Some("http://a".into()),
            ..ConfigFile::default()
        };
        let top = ConfigFile {
            port: Some(2),
            ..ConfigFile::default()
        };
        let merged = base.merge(top);
        assert_eq!(merged.port, Some(2));
        assert_eq!(merged.endpoint.as_deref(), Some("http://a"));
    }
}
