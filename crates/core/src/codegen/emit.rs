//! Go code emission via the Emit trait.
//!
//! Each syntax node renders itself; nested blocks are indented with one tab
//! per level, the way `gofmt` lays them out.

use super::go::{GoConst, GoDecl, GoExpr, GoFile, GoFunc, GoImport, GoParam, GoStmt, GoStruct};
use super::utils::go_quote;

/// Trait for emitting Go source from syntax nodes.
pub trait Emit {
    /// Convert the node to its Go source representation.
    fn emit(&self) -> String;
}

fn tabs(indent: usize) -> String {
    "\t".repeat(indent)
}

fn doc_comment(doc: Option<&str>, out: &mut String) {
    if let Some(doc) = doc {
        for line in doc.lines() {
            out.push_str("// ");
            out.push_str(line);
            out.push('\n');
        }
    }
}

fn join<T: Emit>(items: &[T]) -> String {
    items.iter().map(Emit::emit).collect::<Vec<_>>().join(", ")
}

/// `{`, the statements one level deeper, then `}` at `indent`.
fn block(body: &[GoStmt], indent: usize) -> String {
    if body.is_empty() {
        return "{}".to_string();
    }
    let mut output = String::from("{\n");
    for stmt in body {
        output.push_str(&stmt.emit_indented(indent + 1));
    }
    output.push_str(&tabs(indent));
    output.push('}');
    output
}

// =============================================================================
// Expressions
// =============================================================================

impl Emit for GoExpr {
    fn emit(&self) -> String {
        self.emit_at(0)
    }
}

impl GoExpr {
    /// Emit with function literal bodies indented relative to `indent`.
    pub fn emit_at(&self, indent: usize) -> String {
        match self {
            GoExpr::Ident(name) => name.clone(),
            GoExpr::Str(value) => go_quote(value),
            GoExpr::Nil => "nil".to_string(),
            GoExpr::Selector { operand, field } => format!("{}.{}", operand.emit_at(indent), field),
            GoExpr::Call {
                callee,
                args,
                spread,
            } => {
                let args_str = args
                    .iter()
                    .map(|a| a.emit_at(indent))
                    .collect::<Vec<_>>()
                    .join(", ");
                let dots = if *spread { "..." } else { "" };
                format!("{}({}{})", callee.emit_at(indent), args_str, dots)
            }
            GoExpr::AddrOf(inner) => format!("&{}", inner.emit_at(indent)),
            GoExpr::Deref(inner) => format!("*{}", inner.emit_at(indent)),
            GoExpr::Composite { ty, fields } => {
                if fields.is_empty() {
                    return format!("{ty}{{}}");
                }
                let parts: Vec<_> = fields
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value.emit_at(indent)))
                    .collect();
                format!("{}{{{}}}", ty, parts.join(", "))
            }
            GoExpr::FuncLit { params, body } => {
                format!("func({}) {}", join(params), block(body, indent))
            }
            GoExpr::Binary { left, op, right } => {
                format!("{} {} {}", left.emit_at(indent), op, right.emit_at(indent))
            }
        }
    }
}

impl Emit for GoParam {
    fn emit(&self) -> String {
        format!("{} {}", self.name, self.ty)
    }
}

// =============================================================================
// Statements
// =============================================================================

impl Emit for GoStmt {
    fn emit(&self) -> String {
        self.emit_indented(1)
    }
}

impl GoStmt {
    /// Emit with the given indentation level, one tab per level.
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = tabs(indent);
        match self {
            GoStmt::Blank => "\n".to_string(),
            _ => format!("{}{}\n", prefix, self.emit_inline(indent)),
        }
    }

    /// Statement text without indentation or trailing newline.
    fn emit_inline(&self, indent: usize) -> String {
        match self {
            GoStmt::Define { names, value } => {
                format!("{} := {}", names.join(", "), value.emit_at(indent))
            }
            GoStmt::Assign { names, value } => {
                format!("{} = {}", names.join(", "), value.emit_at(indent))
            }
            GoStmt::Var { name, ty } => format!("var {name} {ty}"),
            GoStmt::Expr(expr) => expr.emit_at(indent),
            GoStmt::If { init, cond, body } => {
                let init_str = init
                    .as_ref()
                    .map(|stmt| format!("{}; ", stmt.emit_inline(indent)))
                    .unwrap_or_default();
                format!("if {}{} {}", init_str, cond.emit_at(indent), block(body, indent))
            }
            GoStmt::Return(values) => {
                if values.is_empty() {
                    "return".to_string()
                } else {
                    let values_str = values
                        .iter()
                        .map(|v| v.emit_at(indent))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("return {values_str}")
                }
            }
            GoStmt::Blank => String::new(),
        }
    }
}

// =============================================================================
// Declarations
// =============================================================================

impl Emit for GoConst {
    fn emit(&self) -> String {
        let mut output = String::new();
        doc_comment(self.doc.as_deref(), &mut output);
        output.push_str(&format!("const {} = {}\n", self.name, self.value.emit()));
        output
    }
}

impl Emit for GoStruct {
    fn emit(&self) -> String {
        let mut output = String::new();
        doc_comment(self.doc.as_deref(), &mut output);
        if self.fields.is_empty() {
            output.push_str(&format!("type {} struct{{}}\n", self.name));
            return output;
        }
        output.push_str(&format!("type {} struct {{\n", self.name));
        for field in &self.fields {
            output.push_str(&format!("\t{} {}\n", field.name, field.ty));
        }
        output.push_str("}\n");
        output
    }
}

impl Emit for GoFunc {
    fn emit(&self) -> String {
        let mut output = String::new();
        doc_comment(self.doc.as_deref(), &mut output);

        output.push_str("func ");
        if let Some(receiver) = &self.receiver {
            output.push_str(&format!("({}) ", receiver.emit()));
        }
        output.push_str(&format!("{}({})", self.name, join(&self.params)));

        match self.results.as_slice() {
            [] => {}
            [single] => output.push_str(&format!(" {single}")),
            results => output.push_str(&format!(" ({})", results.join(", "))),
        }

        output.push(' ');
        output.push_str(&block(&self.body, 0));
        output.push('\n');
        output
    }
}

impl Emit for GoDecl {
    fn emit(&self) -> String {
        match self {
            GoDecl::Const(c) => c.emit(),
            GoDecl::Struct(s) => s.emit(),
            GoDecl::Func(f) => f.emit(),
        }
    }
}

// =============================================================================
// File
// =============================================================================

impl Emit for GoImport {
    fn emit(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} {}", alias, go_quote(&self.path)),
            None => go_quote(&self.path),
        }
    }
}

impl Emit for GoFile {
    fn emit(&self) -> String {
        let mut output = String::new();

        for line in &self.header {
            output.push_str(&format!("// {line}\n"));
        }
        if !self.header.is_empty() {
            output.push('\n');
        }

        output.push_str(&format!("package {}\n", self.package));

        // Standard library first, then everything else, each group sorted
        let mut std: Vec<&GoImport> = self.imports.iter().filter(|i| i.is_std()).collect();
        let mut other: Vec<&GoImport> = self.imports.iter().filter(|i| !i.is_std()).collect();
        std.sort();
        other.sort();

        if !self.imports.is_empty() {
            output.push_str("\nimport (\n");
            for import in &std {
                output.push_str(&format!("\t{}\n", import.emit()));
            }
            if !std.is_empty() && !other.is_empty() {
                output.push('\n');
            }
            for import in &other {
                output.push_str(&format!("\t{}\n", import.emit()));
            }
            output.push_str(")\n");
        }

        for decl in &self.decls {
            output.push('\n');
            output.push_str(&decl.emit());
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::go::GoField;

    #[test]
    fn test_emit_expressions() {
        let call = GoExpr::qualified("vertex", "Pattern").call(vec![GoExpr::str("GET"), GoExpr::str("/items")]);
        assert_eq!(call.emit(), "vertex.Pattern(\"GET\", \"/items\")");

        let spread = GoExpr::Call {
            callee: Box::new(GoExpr::qualified("svc", "Tag")),
            args: vec![GoExpr::ident("id"), GoExpr::ident("names")],
            spread: true,
        };
        assert_eq!(spread.emit(), "svc.Tag(id, names...)");

        assert_eq!(GoExpr::ident("x").addr_of().emit(), "&x");
        assert_eq!(GoExpr::ident("addr").deref().emit(), "*addr");
        assert_eq!(GoExpr::ident("err").not_nil().emit(), "err != nil");
        assert_eq!(
            GoExpr::Composite {
                ty: "Client".into(),
                fields: vec![("rt".into(), GoExpr::ident("rt"))],
            }
            .emit(),
            "Client{rt: rt}"
        );
    }

    #[test]
    fn test_emit_if_err() {
        let stmt = GoStmt::if_err(
            "err",
            GoExpr::qualified("args", "Decode").call(vec![GoExpr::str("id"), GoExpr::ident("id").addr_of()]),
            vec![GoStmt::Return(vec![])],
        );
        assert_eq!(
            stmt.emit_indented(1),
            "\tif err := args.Decode(\"id\", &id); err != nil {\n\t\treturn\n\t}\n"
        );
    }

    #[test]
    fn test_emit_func_literal_indentation() {
        let stmt = GoStmt::Expr(GoExpr::qualified("mux", "HandleFunc").call(vec![
            GoExpr::str("GET /"),
            GoExpr::FuncLit {
                params: vec![GoParam::new("w", "http.ResponseWriter")],
                body: vec![GoStmt::Return(vec![])],
            },
        ]));
        assert_eq!(
            stmt.emit_indented(1),
            "\tmux.HandleFunc(\"GET /\", func(w http.ResponseWriter) {\n\t\treturn\n\t})\n"
        );
    }

    #[test]
    fn test_emit_func_and_method() {
        let func = GoFunc {
            doc: Some("Ping checks the server.".into()),
            receiver: Some(GoParam::new("c", "*Client")),
            name: "Ping".into(),
            params: vec![GoParam::new("n", "int")],
            results: vec!["string".into(), "error".into()],
            body: vec![
                GoStmt::Var {
                    name: "result".into(),
                    ty: "string".into(),
                },
                GoStmt::Blank,
                GoStmt::Return(vec![GoExpr::ident("result"), GoExpr::Nil]),
            ],
        };
        assert_eq!(
            func.emit(),
            "// Ping checks the server.\nfunc (c *Client) Ping(n int) (string, error) {\n\tvar result string\n\n\treturn result, nil\n}\n"
        );

        let empty = GoFunc {
            doc: None,
            receiver: None,
            name: "noop".into(),
            params: vec![],
            results: vec![],
            body: vec![],
        };
        assert_eq!(empty.emit(), "func noop() {}\n");
    }

    #[test]
    fn test_emit_file() {
        let file = GoFile {
            header: vec!["Code generated by vertex. DO NOT EDIT.".into()],
            package: "client".into(),
            imports: vec![
                GoImport::new("vertex"),
                GoImport {
                    alias: Some("shop".into()),
                    path: "example.com/app/internal/shop-v2".into(),
                },
                GoImport::new("net/http"),
            ],
            decls: vec![
                GoDecl::Const(GoConst {
                    doc: None,
                    name: "DefaultEndpoint".into(),
                    value: GoExpr::str("http://localhost:8080"),
                }),
                GoDecl::Struct(GoStruct {
                    doc: None,
                    name: "Client".into(),
                    fields: vec![GoField {
                        name: "rt".into(),
                        ty: "*vertex.Client".into(),
                    }],
                }),
            ],
        };
        assert_eq!(
            file.emit(),
            "// Code generated by vertex. DO NOT EDIT.\n\npackage client\n\nimport (\n\t\"net/http\"\n\t\"vertex\"\n\n\tshop \"example.com/app/internal/shop-v2\"\n)\n\nconst DefaultEndpoint = \"http://localhost:8080\"\n\ntype Client struct {\n\trt *vertex.Client\n}\n"
        );
    }
}
