//! Declaration Catalog: aggregate type name -> owning unit.
//!
//! Built from a full scan of every parsed file before any route is resolved,
//! so forward references across files and packages always resolve no matter
//! in which order the files were read.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::syntax::{FuncDecl, SourceFile, TypeExpr};

/// Where a catalogued aggregate was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Unit (package) name
    pub unit: String,
    /// Import path of the declaring package
    pub import_path: String,
}

/// Zero-argument `New<Aggregate>` function declared next to an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constructor {
    /// Function name
    pub name: String,
    /// Whether it returns `*Aggregate` rather than `Aggregate`
    pub returns_pointer: bool,
}

/// Mapping from struct type names to the unit that declares them.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    aggregates: HashMap<String, Declaration>,
    constructors: HashMap<String, Constructor>,
}

impl Catalog {
    /// Scan every file and record each top-level struct declaration.
    ///
    /// Aliases and interfaces never enter the catalog. When two units declare
    /// the same name, the first one in file order is kept.
    pub fn build(files: &[SourceFile], module: &str) -> Self {
        let mut catalog = Catalog::default();

        for file in files {
            let import_path = import_path(module, &file.rel_dir);
            for decl in file.types.iter().filter(|d| !d.alias && d.ty.is_struct()) {
                match catalog.aggregates.get(&decl.name) {
                    Some(existing) if existing.import_path != import_path => {
                        warn!(
                            aggregate = %decl.name,
                            kept = %existing.import_path,
                            ignored = %import_path,
                            "Aggregate declared in more than one package, keeping the first."
                        );
                    }
                    Some(_) => {}
                    None => {
                        catalog.aggregates.insert(
                            decl.name.clone(),
                            Declaration {
                                unit: file.unit.clone(),
                                import_path: import_path.clone(),
                            },
                        );
                    }
                }
            }
        }

        for file in files {
            let import_path = import_path(module, &file.rel_dir);
            for func in &file.functions {
                let Some((aggregate, constructor)) = constructor_of(func) else {
                    continue;
                };
                let declared_here = catalog
                    .aggregates
                    .get(aggregate)
                    .is_some_and(|d| d.import_path == import_path);
                if declared_here && !catalog.constructors.contains_key(aggregate) {
                    catalog.constructors.insert(aggregate.to_string(), constructor);
                }
            }
        }

        debug!(
            aggregates = catalog.aggregates.len(),
            constructors = catalog.constructors.len(),
            "Built declaration catalog."
        );

        catalog
    }

    /// Build a catalog directly from `(name, unit)` pairs; the unit doubles as import path.
    pub fn from_units<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let aggregates = entries
            .into_iter()
            .map(|(name, unit)| {
                (
                    name.to_string(),
                    Declaration {
                        unit: unit.to_string(),
                        import_path: unit.to_string(),
                    },
                )
            })
            .collect();
        Catalog {
            aggregates,
            constructors: HashMap::new(),
        }
    }

    /// Owning unit of an aggregate name.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.aggregates.get(name).map(|d| d.unit.as_str())
    }

    /// Where an aggregate name was declared.
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.aggregates.get(name)
    }

    /// Constructor found for an aggregate, if any.
    pub fn constructor(&self, aggregate: &str) -> Option<&Constructor> {
        self.constructors.get(aggregate)
    }

    /// Number of catalogued aggregates.
    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    /// Whether no aggregate was catalogued.
    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }
}

/// Import path of a package directory inside a module.
pub fn import_path(module: &str, rel_dir: &str) -> String {
    let rel_dir = rel_dir.trim_matches('/');
    if rel_dir.is_empty() {
        module.to_string()
    } else {
        format!("{module}/{rel_dir}")
    }
}

fn constructor_of(func: &FuncDecl) -> Option<(&str, Constructor)> {
    if func.receiver.is_some() || !func.params.is_empty() || func.results.len() != 1 {
        return None;
    }
    let aggregate = func.name.strip_prefix("New").filter(|rest| !rest.is_empty())?;
    let result = &func.results[0];
    if result.arity() != 1 {
        return None;
    }
    let returns_pointer = match &result.ty {
        TypeExpr::Name(name) if name == aggregate => false,
        TypeExpr::Pointer(inner) if matches!(inner.as_ref(), TypeExpr::Name(name) if name == aggregate) => {
            true
        }
        _ => return None,
    };
    Some((
        aggregate,
        Constructor {
            name: func.name.clone(),
            returns_pointer,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{FieldGroup, InterfaceElem, TypeDecl};

    fn file(unit: &str, rel_dir: &str, types: Vec<TypeDecl>, functions: Vec<FuncDecl>) -> SourceFile {
        SourceFile {
            path: format!("{rel_dir}/{unit}.go").into(),
            rel_dir: rel_dir.to_string(),
            unit: unit.to_string(),
            imports: Vec::new(),
            types,
            functions,
        }
    }

    fn struct_decl(name: &str) -> TypeDecl {
        TypeDecl {
            name: name.to_string(),
            alias: false,
            ty: TypeExpr::Struct { fields: Vec::new() },
        }
    }

    fn func(name: &str, params: Vec<FieldGroup>, results: Vec<FieldGroup>) -> FuncDecl {
        FuncDecl {
            name: name.to_string(),
            doc: Vec::new(),
            receiver: None,
            params,
            results,
        }
    }

    #[test]
    fn test_catalog_records_structs_only() {
        let files = vec![file(
            "shop",
            "shop",
            vec![
                struct_decl("Product"),
                TypeDecl {
                    name: "Named".into(),
                    alias: true,
                    ty: TypeExpr::Struct { fields: Vec::new() },
                },
                TypeDecl {
                    name: "Store".into(),
                    alias: false,
                    ty: TypeExpr::Interface {
                        elems: vec![InterfaceElem::Embedded(TypeExpr::name("any"))],
                    },
                },
                TypeDecl {
                    name: "ID".into(),
                    alias: false,
                    ty: TypeExpr::name("string"),
                },
            ],
            Vec::new(),
        )];

        let catalog = Catalog::build(&files, "example.com/app");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("Product"), Some("shop"));
        assert_eq!(catalog.lookup("Named"), None);
        assert_eq!(catalog.lookup("Store"), None);
        assert_eq!(catalog.lookup("ID"), None);
        assert_eq!(
            catalog.declaration("Product").map(|d| d.import_path.as_str()),
            Some("example.com/app/shop")
        );
    }

    #[test]
    fn test_catalog_keeps_first_duplicate() {
        let files = vec![
            file("alpha", "alpha", vec![struct_decl("Item")], Vec::new()),
            file("beta", "beta", vec![struct_decl("Item")], Vec::new()),
        ];
        let catalog = Catalog::build(&files, "m");
        assert_eq!(catalog.lookup("Item"), Some("alpha"));
    }

    #[test]
    fn test_catalog_finds_constructors() {
        let files = vec![file(
            "shop",
            "shop",
            vec![struct_decl("Cart"), struct_decl("Till")],
            vec![
                func(
                    "NewCart",
                    Vec::new(),
                    vec![FieldGroup::unnamed(TypeExpr::pointer(TypeExpr::name("Cart")))],
                ),
                func("NewTill", Vec::new(), vec![FieldGroup::unnamed(TypeExpr::name("Till"))]),
                func(
                    "NewOther",
                    vec![FieldGroup::named(["n"], TypeExpr::name("int"))],
                    vec![FieldGroup::unnamed(TypeExpr::name("Other"))],
                ),
            ],
        )];

        let catalog = Catalog::build(&files, "m");
        assert_eq!(
            catalog.constructor("Cart"),
            Some(&Constructor {
                name: "NewCart".into(),
                returns_pointer: true
            })
        );
        assert_eq!(
            catalog.constructor("Till"),
            Some(&Constructor {
                name: "NewTill".into(),
                returns_pointer: false
            })
        );
        assert_eq!(catalog.constructor("Other"), None);
    }

    #[test]
    fn test_constructor_must_live_in_declaring_package() {
        let files = vec![
            file("shop", "shop", vec![struct_decl("Cart")], Vec::new()),
            file(
                "other",
                "other",
                Vec::new(),
                vec![func(
                    "NewCart",
                    Vec::new(),
                    vec![FieldGroup::unnamed(TypeExpr::name("Cart"))],
                )],
            ),
        ];
        let catalog = Catalog::build(&files, "m");
        assert_eq!(catalog.constructor("Cart"), None);
    }

    #[test]
    fn test_import_path() {
        assert_eq!(import_path("example.com/app", ""), "example.com/app");
        assert_eq!(import_path("example.com/app", "cmd/product"), "example.com/app/cmd/product");
    }
}
