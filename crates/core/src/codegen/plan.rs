//! Generation plan: routes partitioned into aggregate groups and standalone
//! routes, validated once so both artifacts are built from the same checked view.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::go::GoImport;
use super::utils::is_exported;
use crate::error::GenerateError;
use crate::ir::render::is_unsupported;
use crate::ir::{Constructor, IrBundle, RouteDescriptor};
use crate::syntax::ImportSpec;

/// Package the server and client import for the shared wire contract.
pub const RUNTIME_PACKAGE: &str = "vertex";

/// Names the generated files import on their own.
const RESERVED_IMPORTS: &[(&str, &str)] = &[
    ("flag", "flag"),
    ("log", "log"),
    ("http", "net/http"),
    (RUNTIME_PACKAGE, RUNTIME_PACKAGE),
];

/// Methods of one aggregate, exposed as one service sharing a single instance.
#[derive(Debug)]
pub struct Group<'a> {
    /// Aggregate type name
    pub aggregate: &'a str,
    /// Package name the aggregate is spelled with
    pub unit: &'a str,
    /// Import path of the declaring package
    pub import_path: &'a str,
    /// How the shared instance is built, when a constructor exists
    pub constructor: Option<&'a Constructor>,
    /// Routes in declaration order
    pub routes: Vec<&'a RouteDescriptor>,
}

/// Validated view of a bundle that both artifacts are generated from.
#[derive(Debug)]
pub struct Plan<'a> {
    /// Groups in order of first appearance
    pub groups: Vec<Group<'a>>,
    /// Plain functions, in bundle order
    pub standalone: Vec<&'a RouteDescriptor>,
    /// Import name -> path for every user package, across all routes
    imports: BTreeMap<&'a str, &'a str>,
}

impl<'a> Plan<'a> {
    /// Partition and validate every route of `bundle`.
    pub fn new(bundle: &'a IrBundle) -> Result<Self, GenerateError> {
        let mut groups: Vec<Group<'a>> = Vec::new();
        let mut standalone = Vec::new();

        for route in bundle.routes() {
            check_route(route)?;
            match &route.receiver {
                Some(receiver) => {
                    let aggregate = receiver.aggregate.as_str();
                    match groups.iter_mut().find(|g| g.aggregate == aggregate) {
                        Some(group) => {
                            if group.import_path != route.import_path {
                                return Err(GenerateError::AggregateConflict {
                                    aggregate: aggregate.to_string(),
                                    first: group.import_path.to_string(),
                                    second: route.import_path.clone(),
                                });
                            }
                            group.routes.push(route);
                        }
                        None => groups.push(Group {
                            aggregate,
                            unit: &route.unit_name,
                            import_path: &route.import_path,
                            constructor: receiver.constructor.as_ref(),
                            routes: vec![route],
                        }),
                    }
                }
                None => standalone.push(route),
            }
        }

        let plan = Plan {
            imports: resolve_imports(bundle.routes())?,
            groups,
            standalone,
        };
        plan.check_routes_unique()?;
        plan.check_call_names()?;
        Ok(plan)
    }

    /// Grouped routes first, then standalone ones.
    pub fn routes(&self) -> impl Iterator<Item = &'a RouteDescriptor> + '_ {
        self.groups
            .iter()
            .flat_map(|g| g.routes.iter().copied())
            .chain(self.standalone.iter().copied())
    }

    /// Import path of a user package name.
    pub fn import_path(&self, name: &str) -> Option<&'a str> {
        self.imports.get(name).copied()
    }

    /// Import declarations for the given user package names, deduplicated.
    ///
    /// An alias is spelled out only when the name differs from the one Go
    /// would derive from the path.
    pub fn go_imports<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> Vec<GoImport> {
        let mut imports: Vec<GoImport> = names
            .into_iter()
            .filter_map(|name| {
                let path = self.import_path(name)?;
                let derived = ImportSpec {
                    alias: None,
                    path: path.to_string(),
                }
                .local_name();
                Some(GoImport {
                    alias: (derived != name).then(|| name.to_string()),
                    path: path.to_string(),
                })
            })
            .collect();
        imports.sort();
        imports.dedup();
        imports
    }

    fn check_routes_unique(&self) -> Result<(), GenerateError> {
        let mut seen: HashMap<(&str, String), &RouteDescriptor> = HashMap::new();
        for route in self.routes() {
            let key = (route.verb.as_str(), wildcard_shape(pattern_path(&route.path)));
            if let Some(first) = seen.insert(key, route) {
                return Err(GenerateError::DuplicateRoute {
                    verb: route.verb.clone(),
                    path: route.path.clone(),
                    first: qualified_name(first),
                    second: qualified_name(route),
                });
            }
        }
        Ok(())
    }

    fn check_call_names(&self) -> Result<(), GenerateError> {
        for group in &self.groups {
            unique_names(group.routes.iter().map(|r| r.name.as_str()), group.aggregate)?;
        }

        // Standalone routes share the top-level client with the group accessors.
        let top_level = self
            .groups
            .iter()
            .map(|g| g.aggregate)
            .chain(self.standalone.iter().map(|r| r.name.as_str()))
            .chain(["New", "NewDefault"]);
        unique_names(top_level, "Client")?;

        // Registration functions and client types are derived from aggregate names.
        unique_names(
            self.groups
                .iter()
                .map(|g| g.aggregate)
                .chain(["Routes"]),
            "server registrations",
        )?;
        let client_types: Vec<String> = self
            .groups
            .iter()
            .map(|g| format!("{}Client", g.aggregate))
            .chain(["Client".to_string()])
            .collect();
        unique_names(client_types.iter().map(String::as_str), "client types")
    }
}

/// What the Go call of a route hands back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    /// No results at all
    Nothing,
    /// A sole `error` result
    Error,
    /// A first result of type `ty`, with a trailing `error` when fallible
    Value {
        /// Descriptor of the first result
        ty: &'a str,
        /// Whether a trailing `error` follows it
        fallible: bool,
    },
}

impl<'a> Outcome<'a> {
    /// Classify the results of `route`.
    pub fn of(route: &'a RouteDescriptor) -> Self {
        if !route.has_result() {
            Outcome::Nothing
        } else if route.result_count == 1 && route.return_type == "error" {
            Outcome::Error
        } else {
            Outcome::Value {
                ty: &route.return_type,
                fallible: route.returns_error,
            }
        }
    }

    /// Type of the value handed back, if any.
    pub fn value(&self) -> Option<&'a str> {
        match self {
            Outcome::Value { ty, .. } => Some(ty),
            _ => None,
        }
    }
}

/// Path as registered with the mux, without any query string.
pub fn pattern_path(path: &str) -> &str {
    path.split_once('?').map_or(path, |(head, _)| head)
}

/// Path with every wildcard name erased, so `/items/{id}` and `/items/{name}`
/// compare equal the way the mux sees them.
fn wildcard_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some("$") => "{$}",
            Some(name) if name.ends_with("...") => "{...}",
            Some(_) => "{}",
            None => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn check_route(route: &RouteDescriptor) -> Result<(), GenerateError> {
    if let Some(descriptor) = route.descriptors().find(|d| is_unsupported(d)) {
        return Err(GenerateError::UnsupportedType {
            route: qualified_name(route),
            descriptor: descriptor.to_string(),
        });
    }
    if !route.path.starts_with('/') {
        return Err(GenerateError::InvalidPath {
            route: qualified_name(route),
            path: route.path.clone(),
        });
    }
    if let Some(package) = route.unresolved.iter().next() {
        return Err(GenerateError::UnresolvedPackage {
            route: qualified_name(route),
            package: package.clone(),
        });
    }
    if route.unit_name == "main" || route.imports.iter().any(|i| i.name == "main") {
        return Err(GenerateError::UnimportableUnit {
            route: qualified_name(route),
        });
    }
    for name in std::iter::once(route.name.as_str()).chain(route.aggregate()) {
        if !is_exported(name) {
            return Err(GenerateError::Unexported {
                route: qualified_name(route),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Build one import table for every route, rejecting names bound to two paths.
fn resolve_imports(routes: &[RouteDescriptor]) -> Result<BTreeMap<&str, &str>, GenerateError> {
    let mut table: BTreeMap<&str, &str> = BTreeMap::new();
    let reserved: HashMap<&str, &str> = RESERVED_IMPORTS.iter().copied().collect();

    let wanted = routes.iter().flat_map(|route| {
        std::iter::once((route.unit_name.as_str(), route.import_path.as_str())).chain(
            route
                .imports
                .iter()
                .map(|i| (i.name.as_str(), i.path.as_str())),
        )
    });

    for (name, path) in wanted {
        let existing = reserved
            .get(name)
            .copied()
            .or_else(|| table.get(name).copied());
        match existing {
            Some(first) if first != path => {
                return Err(GenerateError::ImportConflict {
                    name: name.to_string(),
                    first: first.to_string(),
                    second: path.to_string(),
                });
            }
            Some(_) => {}
            None => {
                table.insert(name, path);
            }
        }
    }
    Ok(table)
}

fn unique_names<'n>(names: impl Iterator<Item = &'n str>, scope: &str) -> Result<(), GenerateError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(GenerateError::DuplicateCall {
                name: name.to_string(),
                scope: scope.to_string(),
            });
        }
    }
    Ok(())
}

fn qualified_name(route: &RouteDescriptor) -> String {
    match route.aggregate() {
        Some(aggregate) => format!("{}.{}.{}", route.unit_name, aggregate, route.name),
        None => format!("{}.{}", route.unit_name, route.name),
    }
}
