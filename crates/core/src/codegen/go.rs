//! Go syntax model for the generated artifacts.
//!
//! Types are carried as already rendered strings: route descriptors are
//! valid Go type expressions, so the model never needs to take them apart.

/// One generated Go source file.
#[derive(Debug, Clone)]
pub struct GoFile {
    /// Leading comment lines, without the `//` marker
    pub header: Vec<String>,
    /// Package clause
    pub package: String,
    /// Imports, emitted standard library first
    pub imports: Vec<GoImport>,
    /// Top-level declarations in emission order
    pub decls: Vec<GoDecl>,
}

/// `import alias "path"`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GoImport {
    /// Import path
    pub path: String,
    /// Explicit package name, when it differs from the derived one
    pub alias: Option<String>,
}

impl GoImport {
    /// Import without an alias.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            alias: None,
            path: path.into(),
        }
    }

    /// Standard library imports have no dot in their first path segment.
    pub fn is_std(&self) -> bool {
        !self.path.split('/').next().unwrap_or_default().contains('.')
    }
}

/// Top-level declaration
#[derive(Debug, Clone)]
pub enum GoDecl {
    /// `const Name = value`
    Const(GoConst),
    /// `type Name struct { ... }`
    Struct(GoStruct),
    /// `func ...`
    Func(GoFunc),
}

/// Untyped constant.
#[derive(Debug, Clone)]
pub struct GoConst {
    /// Doc comment text, without the `//` marker
    pub doc: Option<String>,
    /// Identifier
    pub name: String,
    /// Constant value
    pub value: GoExpr,
}

/// Named struct type.
#[derive(Debug, Clone)]
pub struct GoStruct {
    /// Doc comment text, without the `//` marker
    pub doc: Option<String>,
    /// Identifier
    pub name: String,
    /// Fields in order
    pub fields: Vec<GoField>,
}

/// Struct field.
#[derive(Debug, Clone)]
pub struct GoField {
    /// Identifier
    pub name: String,
    /// Rendered field type
    pub ty: String,
}

/// Function or method declaration
#[derive(Debug, Clone)]
pub struct GoFunc {
    /// Doc comment text, without the `//` marker
    pub doc: Option<String>,
    /// Method receiver, `None` for plain functions
    pub receiver: Option<GoParam>,
    /// Identifier
    pub name: String,
    /// Parameters in declaration order
    pub params: Vec<GoParam>,
    /// Result types, unnamed
    pub results: Vec<String>,
    /// Statements of the body
    pub body: Vec<GoStmt>,
}

/// Named parameter or receiver.
#[derive(Debug, Clone)]
pub struct GoParam {
    /// Identifier
    pub name: String,
    /// Rendered parameter type
    pub ty: String,
}

impl GoParam {
    /// Parameter `name ty`.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Go expression
#[derive(Debug, Clone)]
pub enum GoExpr {
    /// Identifier: foo
    Ident(String),
    /// Interpreted string literal: "foo"
    Str(String),
    /// nil
    Nil,
    /// Selector: pkg.Name, value.field
    Selector {
        /// Left of the dot
        operand: Box<GoExpr>,
        /// Right of the dot
        field: String,
    },
    /// Call: f(a, b) or f(a, rest...)
    Call {
        /// Called expression
        callee: Box<GoExpr>,
        /// Arguments in order
        args: Vec<GoExpr>,
        /// Whether the last argument is spread with `...`
        spread: bool,
    },
    /// Address-of: &x
    AddrOf(Box<GoExpr>),
    /// Dereference: *x
    Deref(Box<GoExpr>),
    /// Composite literal: T{a: x}
    Composite {
        /// Literal type
        ty: String,
        /// Keyed elements in order
        fields: Vec<(String, GoExpr)>,
    },
    /// Function literal: func(w http.ResponseWriter) { ... }
    FuncLit {
        /// Parameters in order
        params: Vec<GoParam>,
        /// Statements of the body
        body: Vec<GoStmt>,
    },
    /// Binary comparison: err != nil
    Binary {
        /// Left operand
        left: Box<GoExpr>,
        /// Operator token
        op: &'static str,
        /// Right operand
        right: Box<GoExpr>,
    },
}

impl GoExpr {
    /// Identifier expression.
    pub fn ident(name: impl Into<String>) -> Self {
        GoExpr::Ident(name.into())
    }

    /// String literal, escaped on emission.
    pub fn str(value: impl Into<String>) -> Self {
        GoExpr::Str(value.into())
    }

    /// `operand.field`
    pub fn select(self, field: impl Into<String>) -> Self {
        GoExpr::Selector {
            operand: Box::new(self),
            field: field.into(),
        }
    }

    /// `self(args...)`
    pub fn call(self, args: Vec<GoExpr>) -> Self {
        GoExpr::Call {
            callee: Box::new(self),
            args,
            spread: false,
        }
    }

    /// `pkg.name`, the usual callee shape
    pub fn qualified(package: &str, name: &str) -> Self {
        GoExpr::ident(package).select(name)
    }

    /// `&self`
    pub fn addr_of(self) -> Self {
        GoExpr::AddrOf(Box::new(self))
    }

    /// `*self`
    pub fn deref(self) -> Self {
        GoExpr::Deref(Box::new(self))
    }

    /// `self != nil`
    pub fn not_nil(self) -> Self {
        GoExpr::Binary {
            left: Box::new(self),
            op: "!=",
            right: Box::new(GoExpr::Nil),
        }
    }
}

/// Statement in a function body
#[derive(Debug, Clone)]
pub enum GoStmt {
    /// a, b := value
    Define {
        /// Names on the left
        names: Vec<String>,
        /// Value on the right
        value: GoExpr,
    },
    /// a, b = value
    Assign {
        /// Names on the left
        names: Vec<String>,
        /// Value on the right
        value: GoExpr,
    },
    /// var name T
    Var {
        /// Declared name
        name: String,
        /// Rendered type
        ty: String,
    },
    /// Expression statement
    Expr(GoExpr),
    /// if init; cond { body }
    If {
        /// Optional init statement
        init: Option<Box<GoStmt>>,
        /// Condition
        cond: GoExpr,
        /// Statements run when the condition holds
        body: Vec<GoStmt>,
    },
    /// return a, b
    Return(Vec<GoExpr>),
    /// Empty line separating groups of statements
    Blank,
}

impl GoStmt {
    /// `name := value`
    pub fn define(name: impl Into<String>, value: GoExpr) -> Self {
        GoStmt::Define {
            names: vec![name.into()],
            value,
        }
    }

    /// `if err := value; err != nil { body }`
    pub fn if_err(err: &str, value: GoExpr, body: Vec<GoStmt>) -> Self {
        GoStmt::If {
            init: Some(Box::new(GoStmt::define(err, value))),
            cond: GoExpr::ident(err).not_nil(),
            body,
        }
    }
}
