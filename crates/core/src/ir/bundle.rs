//! IR Bundle: the module identifier plus every route, frozen for generation.

use serde::Serialize;
use tracing::info;

use super::catalog::Catalog;
use super::route::{RouteBuilder, RouteDescriptor};
use crate::syntax::SourceFile;

/// Immutable input of the code generator.
#[derive(Debug, Clone, Serialize)]
pub struct IrBundle {
    module: String,
    routes: Vec<RouteDescriptor>,
}

impl IrBundle {
    /// Resolve the routes of every file, in file order then declaration order.
    ///
    /// The catalog must already cover all of `files`.
    pub fn assemble(module: &str, files: &[SourceFile], catalog: &Catalog) -> Self {
        let builder = RouteBuilder::new(module, catalog);
        let routes: Vec<RouteDescriptor> = files.iter().flat_map(|file| builder.routes(file)).collect();

        info!(
            module = %module,
            files = files.len(),
            routes = routes.len(),
            "Assembled IR bundle."
        );

        Self::new(module, routes)
    }

    /// Bundle over already resolved routes.
    pub fn new(module: impl Into<String>, routes: Vec<RouteDescriptor>) -> Self {
        Self {
            module: module.into(),
            routes,
        }
    }

    /// Module identifier the import paths are relative to.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Routes in file order, then declaration order.
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// Pretty-printed JSON form, as written by `--emit-ir`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
