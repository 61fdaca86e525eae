//! Go code generation.
//!
//! The pipeline is IR bundle -> [`plan::Plan`] -> Go syntax ([`go`]) -> text
//! ([`emit::Emit`]). The plan validates everything up front, so either both
//! artifacts are produced or neither is.

pub mod emit;
pub mod go;
pub mod plan;
pub mod runtime;

mod client;
mod server;
mod utils;

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::GenerateError;
use crate::ir::IrBundle;
use emit::Emit;
use plan::Plan;

pub use runtime::{MIN_GO_VERSION, RuntimePackage};
pub use utils::is_go_identifier;

/// First line of every generated Go file.
pub const GENERATED_HEADER: &str = "Code generated by vertex. DO NOT EDIT.";

/// Knobs of one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Package name of the client artifact
    pub client_package: String,
    /// Default port the server listens on
    pub listen_port: u16,
    /// Default endpoint the client calls
    pub endpoint: String,
    /// Pipe both artifacts through `gofmt` when it is available
    pub format: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            client_package: "client".to_string(),
            listen_port: 8080,
            endpoint: "http://localhost:8080".to_string(),
            format: true,
        }
    }
}

/// The two generated sources, always produced together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPair {
    /// Source of the server `main` package
    pub server: String,
    /// Source of the client package
    pub client: String,
}

/// Generate the server and client artifacts for a bundle.
pub fn generate(bundle: &IrBundle, options: &GenerateOptions) -> Result<ArtifactPair, GenerateError> {
    let plan = Plan::new(bundle)?;
    debug!(
        "Planned {} aggregate groups and {} standalone routes",
        plan.groups.len(),
        plan.standalone.len()
    );

    let mut pair = ArtifactPair {
        server: server::server_file(&plan, options.listen_port).emit(),
        client: client::client_file(&plan, &options.client_package, &options.endpoint).emit(),
    };

    if options.format {
        match which::which("gofmt") {
            Ok(gofmt) => {
                pair.server = format_source(&gofmt, &pair.server, "server")?;
                pair.client = format_source(&gofmt, &pair.client, "client")?;
            }
            Err(_) => warn!("gofmt not found on PATH, leaving generated code unformatted"),
        }
    }

    info!("Generated artifacts for {} routes", bundle.routes().len());
    Ok(pair)
}

/// Run `gofmt` over one source through stdin.
fn format_source(gofmt: &std::path::Path, source: &str, artifact: &'static str) -> Result<String, GenerateError> {
    let mut child = Command::new(gofmt)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(GenerateError::FormatIo)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(source.as_bytes())
            .map_err(GenerateError::FormatIo)?;
    }

    let output = child.wait_with_output().map_err(GenerateError::FormatIo)?;
    if !output.status.success() {
        return Err(GenerateError::Format {
            artifact,
            output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    debug!("Formatted {} artifact", artifact);
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
