//! Parser-independent view of a Go source tree.
//!
//! The IR stages only ever see these types: declarations with an optional
//! receiver, ordered parameter groups, ordered results and attached comment
//! lines. Any front end able to produce them can drive the pipeline.

use std::path::PathBuf;

/// One parsed source file.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    /// Path of the file on disk
    pub path: PathBuf,
    /// Directory of the file relative to the module root, `/`-separated ("" for the root)
    pub rel_dir: String,
    /// Compilation-unit (package) name from the package clause
    pub unit: String,
    /// Import declarations, in source order
    pub imports: Vec<ImportSpec>,
    /// Top-level type declarations, in source order
    pub types: Vec<TypeDecl>,
    /// Top-level functions and methods, in source order
    pub functions: Vec<FuncDecl>,
}

/// `import alias "path"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit package name (`.` and `_` included)
    pub alias: Option<String>,
    /// Import path, unquoted
    pub path: String,
}

impl ImportSpec {
    /// Name the imported package is referred to by inside the importing file.
    ///
    /// Without an explicit alias this is the name goimports assumes: the last
    /// segment (or the one before a `/vN` major version suffix), minus a
    /// leading `go-`, cut at the first character that cannot appear in an
    /// identifier.
    pub fn local_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }

        let mut segments = self.path.rsplit('/');
        let mut last = segments.next().unwrap_or_default();
        if is_major_version(last) {
            if let Some(previous) = segments.next() {
                last = previous;
            }
        }

        let last = last.strip_prefix("go-").unwrap_or(last);
        let end = last
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(last.len());
        last[..end].to_string()
    }
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

/// `type Name T` or `type Name = T`
#[derive(Debug, Clone)]
pub struct TypeDecl {
    /// Declared type name
    pub name: String,
    /// True for alias declarations (`type A = B`)
    pub alias: bool,
    /// Underlying or aliased type
    pub ty: TypeExpr,
}

/// A function or method declaration.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    /// Function or method name
    pub name: String,
    /// Raw text of each comment in the attached doc comment group
    pub doc: Vec<String>,
    /// Receiver of a method, `None` for plain functions
    pub receiver: Option<FieldGroup>,
    /// Parameter groups in declaration order
    pub params: Vec<FieldGroup>,
    /// Result groups in declaration order
    pub results: Vec<FieldGroup>,
}

/// Zero or more names sharing one type (`a, b int`), plus an optional struct tag.
#[derive(Debug, Clone)]
pub struct FieldGroup {
    /// Declared names, empty for unnamed entries
    pub names: Vec<String>,
    /// Shared type
    pub ty: TypeExpr,
    /// Raw struct tag literal
    pub tag: Option<String>,
}

impl FieldGroup {
    /// Group of one unnamed entry.
    pub fn unnamed(ty: TypeExpr) -> Self {
        Self {
            names: Vec::new(),
            ty,
            tag: None,
        }
    }

    /// Group of named entries sharing `ty`.
    pub fn named<I, S>(names: I, ty: TypeExpr) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ty,
            tag: None,
        }
    }

    /// Number of values the group contributes to a parameter or result list.
    pub fn arity(&self) -> usize {
        self.names.len().max(1)
    }
}

/// Function signature shared by function types and interface methods.
#[derive(Debug, Clone, Default)]
pub struct FuncSig {
    /// Parameter groups
    pub params: Vec<FieldGroup>,
    /// Result groups
    pub results: Vec<FieldGroup>,
}

/// Direction of a channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
    /// `chan T`
    Both,
}

/// Length of a fixed-size array type.
#[derive(Debug, Clone)]
pub enum ArrayLen {
    /// Literal length, kept verbatim
    Literal(String),
    /// Constant expression length
    Expr(Box<TypeExpr>),
}

/// Element of an interface type body.
#[derive(Debug, Clone)]
pub enum InterfaceElem {
    /// Method specification
    Method {
        /// Method name
        name: String,
        /// Method signature
        sig: FuncSig,
    },
    /// Embedded interface or type constraint
    Embedded(TypeExpr),
}

/// Type expression shapes.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// Bare name: `int`, `Product`
    Name(String),
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `pkg.Name`
    Qualified {
        /// Package qualifier
        package: String,
        /// Type name
        name: String,
    },
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T`
    Array {
        /// Array length
        len: ArrayLen,
        /// Element type
        elem: Box<TypeExpr>,
    },
    /// `map[K]V`
    Map {
        /// Key type
        key: Box<TypeExpr>,
        /// Value type
        value: Box<TypeExpr>,
    },
    /// Anonymous `struct{...}`
    Struct {
        /// Field groups in order
        fields: Vec<FieldGroup>,
    },
    /// Anonymous `interface{...}`
    Interface {
        /// Elements in order
        elems: Vec<InterfaceElem>,
    },
    /// `func(...) ...`
    Func(FuncSig),
    /// `...T` in a parameter list
    Variadic(Box<TypeExpr>),
    /// `chan T`, `chan<- T`, `<-chan T`
    Chan {
        /// Allowed directions
        dir: ChanDir,
        /// Element type
        elem: Box<TypeExpr>,
    },
    /// Any shape the model does not cover, identified by its syntax kind
    Unsupported {
        /// Syntax node kind
        kind: String,
    },
}

impl TypeExpr {
    /// Bare name.
    pub fn name(name: impl Into<String>) -> Self {
        TypeExpr::Name(name.into())
    }

    /// `*inner`
    pub fn pointer(inner: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(inner))
    }

    /// `[]elem`
    pub fn slice(elem: TypeExpr) -> Self {
        TypeExpr::Slice(Box::new(elem))
    }

    /// `map[key]value`
    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// `package.name`
    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeExpr::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Whether values of this type are sequences (slices or fixed arrays).
    pub fn is_sequence(&self) -> bool {
        matches!(self, TypeExpr::Slice(_) | TypeExpr::Array { .. })
    }

    /// Bare type name with at most one pointer marker removed.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Name(name) => Some(name.as_str()),
            TypeExpr::Pointer(inner) => match inner.as_ref() {
                TypeExpr::Name(name) => Some(name.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether this is an anonymous struct type.
    pub fn is_struct(&self) -> bool {
        matches!(self, TypeExpr::Struct { .. })
    }
}
