//! Vertex: exposes annotated Go functions and methods as HTTP routes.
//!
//! A Go source tree is parsed, every declaration carrying an `@server`
//! directive becomes a route descriptor, and the descriptors are turned into
//! a server program and a typed client that share one wire contract.
//!
//! ```text
//! go.mod ─┐
//! *.go ───┴─> frontend -> ir (Catalog, RouteBuilder, IrBundle) -> codegen -> server.go + client.go
//! ```

pub mod codegen;
pub mod config;
pub mod engine;
pub mod error;
pub mod frontend;
pub mod gomod;
pub mod ir;
pub mod syntax;

pub use codegen::{ArtifactPair, GenerateOptions, generate};
pub use config::{Config, ConfigFile};
pub use engine::{CompileReport, Engine};
pub use error::{ConfigError, Error, FrontendError, GenerateError, ManifestError};
pub use ir::IrBundle;
