//! Route Descriptor Builder.
//!
//! Combines the directive, the receiver, the parameter groups and the first
//! result of a declaration into one normalized [`RouteDescriptor`].

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use super::catalog::{Catalog, Constructor, import_path};
use super::directive::{self, Directive};
use super::render::{Reference, references, render};
use crate::syntax::{FieldGroup, FuncDecl, SourceFile, TypeExpr};

// =============================================================================
// Descriptor types
// =============================================================================

/// One routable function or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDescriptor {
    /// Declared function or method name
    pub name: String,
    /// Route path exactly as written in the directive
    pub path: String,
    /// HTTP verb exactly as written in the directive
    pub verb: String,
    /// Parameters in declaration order
    pub parameters: Vec<Parameter>,
    /// Descriptor of the first declared result, empty when there is none
    pub return_type: String,
    /// Whether the first result is a slice or array
    pub is_slice: bool,
    /// Receiver of a method, `None` for plain functions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Receiver>,
    /// Package name of the declaring file
    pub unit_name: String,
    /// Import path of the declaring package
    pub import_path: String,
    /// Number of declared results, names expanded
    pub result_count: usize,
    /// Whether the last of two or more results is `error`
    pub returns_error: bool,
    /// Packages the parameter and result descriptors refer to
    pub imports: BTreeSet<Import>,
    /// Package qualifiers no import of the declaring file provides
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub unresolved: BTreeSet<String>,
}

impl RouteDescriptor {
    /// Whether the route is a method of an aggregate.
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }

    /// Whether the declaration has at least one result.
    pub fn has_result(&self) -> bool {
        !self.return_type.is_empty()
    }

    /// Owning aggregate name for methods.
    pub fn aggregate(&self) -> Option<&str> {
        self.receiver.as_ref().map(|r| r.aggregate.as_str())
    }

    /// Every descriptor string this route exposes, in a stable order.
    pub fn descriptors(&self) -> impl Iterator<Item = &str> {
        self.receiver
            .iter()
            .map(|r| r.type_descriptor.as_str())
            .chain(self.parameters.iter().map(|p| p.ty.as_str()))
            .chain(std::iter::once(self.return_type.as_str()))
    }
}

/// One expanded parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Declared name, or `param<index>` for nameless and blank ones
    pub name: String,
    /// Rendered type descriptor
    #[serde(rename = "type")]
    pub ty: String,
}

impl Parameter {
    /// Element type of a variadic parameter (`...T`).
    pub fn variadic_elem(&self) -> Option<&str> {
        self.ty.strip_prefix("...")
    }
}

/// Method receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receiver {
    /// Rendered receiver type, pointer marker included
    pub type_descriptor: String,
    /// Bare aggregate name with one pointer marker stripped
    pub aggregate: String,
    /// Constructor declared next to the aggregate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constructor: Option<Constructor>,
}

/// Package a descriptor needs in scope, under the name it is spelled with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Import {
    /// Package name used in descriptors
    pub name: String,
    /// Import path
    pub path: String,
}

// =============================================================================
// Builder
// =============================================================================

/// Builds route descriptors against a fully populated catalog.
#[derive(Debug)]
pub struct RouteBuilder<'a> {
    module: &'a str,
    catalog: &'a Catalog,
}

impl<'a> RouteBuilder<'a> {
    /// Builder for routes of `module`.
    pub fn new(module: &'a str, catalog: &'a Catalog) -> Self {
        Self { module, catalog }
    }

    /// Routes of one file, in declaration order.
    pub fn routes(&self, file: &SourceFile) -> Vec<RouteDescriptor> {
        file.functions
            .iter()
            .filter(|func| !func.doc.is_empty())
            .filter_map(|func| self.route(file, func))
            .collect()
    }

    /// Descriptor for one declaration, or `None` when it is not routable.
    pub fn route(&self, file: &SourceFile, func: &FuncDecl) -> Option<RouteDescriptor> {
        let Directive { path, verb } = directive::extract(func.doc.as_slice())?;

        let receiver = func.receiver.as_ref().map(|group| {
            let aggregate = group.ty.base_name().unwrap_or_default().to_string();
            Receiver {
                type_descriptor: render(&group.ty, self.catalog),
                constructor: self.catalog.constructor(&aggregate).cloned(),
                aggregate,
            }
        });

        let parameters = self.parameters(&func.params);
        let mut types: Vec<&TypeExpr> = func.params.iter().map(|group| &group.ty).collect();

        let (return_type, is_slice) = match func.results.first() {
            Some(first) => {
                types.push(&first.ty);
                (render(&first.ty, self.catalog), first.ty.is_sequence())
            }
            None => (String::new(), false),
        };

        let result_count = func.results.iter().map(FieldGroup::arity).sum();
        let (imports, unresolved) = self.imports(file, &types);
        for package in &unresolved {
            warn!(
                route = %func.name,
                file = %file.path.display(),
                "No import provides package qualifier {package}."
            );
        }

        let returns_error = result_count >= 2
            && func
                .results
                .last()
                .is_some_and(|group| matches!(&group.ty, TypeExpr::Name(name) if name == "error"));

        let route = RouteDescriptor {
            name: func.name.clone(),
            path,
            verb,
            parameters,
            return_type,
            is_slice,
            receiver,
            unit_name: file.unit.clone(),
            import_path: import_path(self.module, &file.rel_dir),
            result_count,
            returns_error,
            imports,
            unresolved,
        };

        debug!(
            route = %route.name,
            verb = %route.verb,
            path = %route.path,
            params = route.parameters.len(),
            "Resolved route."
        );

        Some(route)
    }

    /// Expand parameter groups, synthesizing names for nameless or blank entries.
    fn parameters(&self, groups: &[FieldGroup]) -> Vec<Parameter> {
        let mut parameters: Vec<Parameter> = Vec::new();
        for group in groups {
            let ty = render(&group.ty, self.catalog);
            if group.names.is_empty() {
                parameters.push(Parameter {
                    name: synthesized(parameters.len()),
                    ty,
                });
                continue;
            }
            for name in &group.names {
                let name = if name == "_" {
                    synthesized(parameters.len())
                } else {
                    name.clone()
                };
                parameters.push(Parameter {
                    name,
                    ty: ty.clone(),
                });
            }
        }
        parameters
    }

    /// Resolve every package qualifier used by the parameter and result types.
    ///
    /// Qualifiers that match no import of `file` come back separately.
    fn imports(&self, file: &SourceFile, types: &[&TypeExpr]) -> (BTreeSet<Import>, BTreeSet<String>) {
        let mut imports = BTreeSet::new();
        let mut unresolved = BTreeSet::new();
        for reference in types.iter().flat_map(|ty| references(ty, self.catalog)) {
            match reference {
                Reference::Aggregate(name) => {
                    if let Some(decl) = self.catalog.declaration(&name) {
                        imports.insert(Import {
                            name: decl.unit.clone(),
                            path: decl.import_path.clone(),
                        });
                    }
                }
                Reference::Package(package) => {
                    let spec = file
                        .imports
                        .iter()
                        .find(|spec| spec.local_name() == package);
                    match spec {
                        Some(spec) => {
                            imports.insert(Import {
                                name: package,
                                path: spec.path.clone(),
                            });
                        }
                        None => {
                            unresolved.insert(package);
                        }
                    }
                }
            }
        }
        (imports, unresolved)
    }
}

fn synthesized(index: usize) -> String {
    format!("param{index}")
}
