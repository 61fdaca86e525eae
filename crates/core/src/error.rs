//! Error types, one enum per pipeline stage plus the top-level [`Error`].

use std::path::PathBuf;

use thiserror::Error;

/// Top-level failure of a compile run.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `go.mod` could not be read, updated or tidied
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The source tree could not be loaded
    #[error(transparent)]
    Frontend(#[from] FrontendError),

    /// The routes could not be turned into artifacts
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// Writing an output file failed
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// File or directory being written
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// The IR bundle could not be encoded as JSON
    #[error("failed to serialize IR bundle: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures while resolving the compile configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `vertex.toml` exists but cannot be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// `vertex.toml` is not valid TOML or has unknown keys
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Parser diagnostic
        #[source]
        source: toml::de::Error,
    },

    /// A configured path cannot be made absolute
    #[error("failed to resolve path {}: {source}", path.display())]
    Resolve {
        /// Path as configured
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// A setting has an unusable value
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Setting name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Failures of the module manifest collaborator (`go.mod`).
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Reading or appending to the manifest failed
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// Manifest or module directory
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// The manifest has no `module` line
    #[error("no module declaration found in {}", path.display())]
    MissingModule {
        /// Manifest path
        path: PathBuf,
    },

    /// `go` is needed for tidying but is not installed
    #[error("go toolchain not found on PATH: {0}")]
    ToolchainNotFound(#[from] which::Error),

    /// `go mod tidy` exited unsuccessfully
    #[error("go mod tidy failed in {} ({status}):\n{output}", dir.display())]
    Tidy {
        /// Module directory
        dir: PathBuf,
        /// Exit status as reported by the OS
        status: String,
        /// Combined stdout and stderr
        output: String,
    },
}

/// Failures while loading and parsing the source tree.
#[derive(Error, Debug)]
pub enum FrontendError {
    /// A source file cannot be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Source file path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// The bundled grammar is incompatible with the parser library
    #[error("failed to load Go grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// The parser gave up on a file
    #[error("parser produced no tree for {}", path.display())]
    Parse {
        /// Source file path
        path: PathBuf,
    },

    /// A file does not parse as Go
    #[error("syntax error in {}:{line}:{column}", path.display())]
    Syntax {
        /// Source file path
        path: PathBuf,
        /// One-based line of the first error
        line: usize,
        /// One-based column of the first error
        column: usize,
    },

    /// A file has no `package` clause
    #[error("missing package clause in {}", path.display())]
    MissingPackage {
        /// Source file path
        path: PathBuf,
    },

    /// A file lies outside the directory holding `go.mod`
    #[error("{} is not inside module root {}", path.display(), root.display())]
    OutsideModule {
        /// Source file path
        path: PathBuf,
        /// Module root
        root: PathBuf,
    },
}

/// Failures while turning the IR bundle into the artifact pair.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// A parameter, result or receiver has a type the generator cannot carry
    #[error("route {route} uses an unsupported type shape: {descriptor}")]
    UnsupportedType {
        /// Qualified route name
        route: String,
        /// Offending type descriptor
        descriptor: String,
    },

    /// Two routes would register the same mux pattern
    #[error("duplicate route {verb} {path} (declared by {first} and {second})")]
    DuplicateRoute {
        /// HTTP verb
        verb: String,
        /// Path of the later route
        path: String,
        /// Route declared first
        first: String,
        /// Route declared second
        second: String,
    },

    /// Two generated calls would share one Go name
    #[error("duplicate call name {name} in {scope}")]
    DuplicateCall {
        /// Clashing name
        name: String,
        /// Where the clash happens
        scope: String,
    },

    /// One aggregate name is declared by routes in two packages
    #[error("aggregate {aggregate} is declared in both {first} and {second}")]
    AggregateConflict {
        /// Aggregate type name
        aggregate: String,
        /// First import path
        first: String,
        /// Second import path
        second: String,
    },

    /// One package name would have to import two paths
    #[error("import name {name} refers to both {first} and {second}")]
    ImportConflict {
        /// Package name
        name: String,
        /// First import path
        first: String,
        /// Second import path
        second: String,
    },

    /// A type is qualified with a package its file never imports
    #[error("route {route} refers to package {package}, which no import of its file provides")]
    UnresolvedPackage {
        /// Qualified route name
        route: String,
        /// Unknown package qualifier
        package: String,
    },

    /// The route lives in package `main`
    #[error("route {route} is declared in package main, which cannot be imported")]
    UnimportableUnit {
        /// Qualified route name
        route: String,
    },

    /// The directive path is not absolute
    #[error("route {route} has path {path:?}, which must start with '/'")]
    InvalidPath {
        /// Qualified route name
        route: String,
        /// Path as written
        path: String,
    },

    /// The function, method or receiver type is not exported
    #[error("route {route} refers to unexported identifier {name}")]
    Unexported {
        /// Qualified route name
        route: String,
        /// Unexported identifier
        name: String,
    },

    /// The runtime template failed to render
    #[error("failed to render {artifact}: {source}")]
    Template {
        /// What was being rendered
        artifact: &'static str,
        /// Template engine failure
        #[source]
        source: tera::Error,
    },

    /// gofmt reported a syntax error in generated code
    #[error("gofmt rejected the {artifact} artifact:\n{output}")]
    Format {
        /// `server` or `client`
        artifact: &'static str,
        /// gofmt diagnostics
        output: String,
    },

    /// gofmt could not be started or talked to
    #[error("failed to run gofmt: {0}")]
    FormatIo(#[source] std::io::Error),
}
