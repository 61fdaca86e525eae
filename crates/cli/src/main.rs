//! Vertex CLI - generate an HTTP server and client for annotated Go code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use vertex_core::{Config, ConfigFile, Engine};

#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
#[command(
    name = "vertex",
    version,
    about = "Expose @server annotated Go functions as an HTTP server and typed client"
)]
struct Args {
    #[arg(
        short,
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Directory of the Go sources to scan"
    )]
    input: PathBuf,
    #[arg(
        short,
        long,
        value_name = "DIR",
        help = "Directory for the generated server and client [default: <input>/generated]"
    )]
    output: Option<PathBuf>,
    #[arg(long, help = "Default listen port of the generated server [default: 8080]")]
    port: Option<u16>,
    #[arg(long, help = "Default endpoint of the generated client [default: http://localhost:<port>]")]
    endpoint: Option<String>,
    #[arg(long = "package", value_name = "NAME", help = "Package name of the generated client [default: client]")]
    client_package: Option<String>,
    #[arg(long, value_name = "FILE", help = "Path to go.mod [default: <input>/go.mod]")]
    manifest: Option<PathBuf>,
    #[arg(long = "no-tidy", help = "Do not run go mod tidy after generating")]
    no_tidy: bool,
    #[arg(long = "no-format", help = "Do not run gofmt on the generated code")]
    no_format: bool,
    #[arg(long = "no-manifest", help = "Do not add the runtime replace directive to go.mod")]
    no_manifest: bool,
    #[arg(long = "emit-ir", value_name = "FILE", help = "Also write the IR bundle as JSON")]
    emit_ir: Option<PathBuf>,
    #[arg(short, long, help = "Log debug output")]
    verbose: bool,
}

impl Args {
    /// Flags the user actually passed, layered over `vertex.toml`.
    fn overrides(&self) -> ConfigFile {
        let disabled = |flag: bool| flag.then_some(false);
        ConfigFile {
            output: self.output.clone(),
            client_package: self.client_package.clone(),
            manifest: self.manifest.clone(),
            port: self.port,
            endpoint: self.endpoint.clone(),
            format: disabled(self.no_format),
            tidy: disabled(self.no_tidy),
            manage_manifest: disabled(self.no_manifest),
            emit_ir: self.emit_ir.clone(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "vertex=debug,vertex_core=debug" } else { "vertex=info,vertex_core=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn run(args: &Args) -> Result<(), vertex_core::Error> {
    let config = Config::resolve(&args.input, args.overrides())?;
    debug!(?config, "Resolved configuration.");
    let report = Engine::new(config).compile()?;

    println!("Generated {} routes for module {}", report.routes, report.module);
    println!("  server:  {}", report.server_path.display());
    println!("  client:  {}", report.client_path.display());
    println!("  runtime: {}", report.runtime_dir.display());
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Messages already embed their underlying cause.
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
