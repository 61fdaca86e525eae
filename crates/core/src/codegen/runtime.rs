//! Runtime support package shared by both artifacts.
//!
//! Rendered from an embedded template into its own module next to the
//! user's `go.mod`, which points at it through a `replace` directive.

use tera::Context;

use super::GENERATED_HEADER;
use super::plan::RUNTIME_PACKAGE;
use crate::error::GenerateError;

const TEMPLATE: &str = include_str!("templates/runtime.go.tera");

/// Minimum Go version: method-aware `ServeMux` patterns and generics.
pub const MIN_GO_VERSION: &str = "1.22";

/// Rendered `go.mod` and source of the runtime package.
#[derive(Debug, Clone)]
pub struct RuntimePackage {
    /// Content of the package's own `go.mod`
    pub go_mod: String,
    /// Content of the single source file
    pub source: String,
}

impl RuntimePackage {
    /// Directory name of the package inside the module root.
    pub const DIR: &'static str = RUNTIME_PACKAGE;
    /// File name of the rendered source.
    pub const SOURCE_FILE: &'static str = "vertex.go";

    /// Render the package from the embedded template.
    pub fn render() -> Result<Self, GenerateError> {
        let mut context = Context::new();
        context.insert("package", RUNTIME_PACKAGE);
        context.insert("header", GENERATED_HEADER);

        let source = tera::Tera::one_off(TEMPLATE, &context, false).map_err(|source| GenerateError::Template {
            artifact: "runtime",
            source,
        })?;

        Ok(Self {
            go_mod: format!("module {RUNTIME_PACKAGE}\n\ngo {MIN_GO_VERSION}\n"),
            source,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_renders() {
        let runtime = RuntimePackage::render().unwrap();
        assert_eq!(runtime.go_mod, "module vertex\n\ngo 1.22\n");
        assert!(runtime.source.starts_with("// Code generated by vertex. DO NOT EDIT."));
        assert!(runtime.source.contains("package vertex\n"));
        assert!(runtime.source.contains("func Pattern(verb, path string) string"));
        assert!(runtime.source.contains("func (c *Client) Call(verb, path string, args Args, out any) error"));
        assert!(runtime.source.contains("fmt.Sprintf(\"vertex: %d %s\""));
        assert!(!runtime.source.contains("{{"));
    }
}
