//! Intermediate representation of the exposed routes.
//!
//! ```text
//! [SourceFile] -> Catalog -> RouteBuilder (render + directive) -> IrBundle
//! ```
//!
//! Every stage here is pure: the catalog is built from a full scan before
//! any route is resolved, and the bundle is never mutated after assembly.

pub mod bundle;
pub mod catalog;
pub mod directive;
pub mod render;
pub mod route;

pub use bundle::IrBundle;
pub use catalog::{Catalog, Constructor, Declaration};
pub use directive::Directive;
pub use route::{Import, Parameter, Receiver, RouteBuilder, RouteDescriptor};
