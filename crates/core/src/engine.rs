//! Compile driver: manifest, front end, IR, generation and output, in order.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::codegen::{self, GenerateOptions, RuntimePackage};
use crate::config::Config;
use crate::error::Error;
use crate::frontend;
use crate::gomod;
use crate::ir::{Catalog, IrBundle};

/// Outcome of a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    /// Module identifier from `go.mod`
    pub module: String,
    /// Number of routes generated
    pub routes: usize,
    /// Written server artifact
    pub server_path: PathBuf,
    /// Written client artifact
    pub client_path: PathBuf,
    /// Written runtime package
    pub runtime_dir: PathBuf,
}

/// Runs compiles for one resolved configuration.
#[derive(Debug)]
pub struct Engine {
    config: Config,
}

impl Engine {
    /// Engine for `config`.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration this engine compiles with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the whole pipeline. Nothing is written, `go.mod` included, unless
    /// both artifacts render.
    pub fn compile(&self) -> Result<CompileReport, Error> {
        let config = &self.config;

        let module = gomod::read_module(&config.manifest_path)?;
        gomod::check_go_version(&config.manifest_path)?;
        info!(module = %module, "Read module manifest.");

        let skip = [config.output_dir.clone(), config.runtime_dir()];
        let files = frontend::load_tree(&config.input_dir, config.module_root(), &skip)?;

        let catalog = Catalog::build(&files, &module);

        let bundle = IrBundle::assemble(&module, &files, &catalog);

        if let Some(path) = &config.emit_ir {
            write_file(path, &bundle.to_json()?)?;
            info!(path = %path.display(), "Wrote IR bundle.");
        }

        let options = GenerateOptions {
            client_package: config.client_package.clone(),
            listen_port: config.port,
            endpoint: config.endpoint.clone(),
            format: config.format,
        };
        let artifacts = codegen::generate(&bundle, &options)?;
        let runtime = RuntimePackage::render()?;

        let runtime_dir = config.runtime_dir();
        let outputs = [
            (runtime_dir.join("go.mod"), runtime.go_mod),
            (runtime_dir.join(RuntimePackage::SOURCE_FILE), runtime.source),
            (config.server_path(), artifacts.server),
            (config.client_path(), artifacts.client),
        ];
        write_staged(&outputs)?;
        for (path, _) in &outputs {
            debug!(path = %path.display(), "Wrote generated file.");
        }

        // The manifest only points at the runtime once the runtime exists.
        if config.manage_manifest {
            gomod::ensure_replace(&config.manifest_path)?;
        }

        if config.tidy {
            gomod::tidy(&config.manifest_path)?;
        }

        Ok(CompileReport {
            module,
            routes: bundle.routes().len(),
            server_path: config.server_path(),
            client_path: config.client_path(),
            runtime_dir,
        })
    }
}

fn create_parent(path: &Path) -> Result<&Path, Error> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    Ok(parent)
}

fn write_file(path: &Path, contents: &str) -> Result<(), Error> {
    create_parent(path)?;
    fs::write(path, contents).map_err(|e| Error::io(path, e))
}

/// Stage every file in a temporary file next to its target, then move them
/// all into place. A failure while staging leaves existing files untouched.
fn write_staged(outputs: &[(PathBuf, String)]) -> Result<(), Error> {
    let mut staged = Vec::with_capacity(outputs.len());
    for (path, contents) in outputs {
        let parent = create_parent(path)?;
        let mut temp = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
        temp.write_all(contents.as_bytes())
            .map_err(|e| Error::io(temp.path(), e))?;
        staged.push((temp, path));
    }

    for (temp, path) in staged {
        temp.persist(path).map_err(|e| Error::io(path, e.error))?;
    }
    Ok(())
}
