//! Go front end on top of `tree-sitter-go`.
//!
//! Lowers one concrete syntax tree into a [`SourceFile`]. Only top-level
//! declarations are kept; function bodies are never inspected.

use std::fmt;
use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::error::FrontendError;
use crate::syntax::{
    ArrayLen, ChanDir, FieldGroup, FuncDecl, FuncSig, ImportSpec, InterfaceElem, SourceFile,
    TypeDecl, TypeExpr,
};

/// Reusable Go parser.
pub struct GoParser {
    parser: Parser,
}

impl fmt::Debug for GoParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoParser").finish_non_exhaustive()
    }
}

impl GoParser {
    /// Parser loaded with the Go grammar.
    pub fn new() -> Result<Self, FrontendError> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_go::LANGUAGE.into())?;
        Ok(Self { parser })
    }

    /// Parse `source` as the content of `path`, located in `rel_dir` of the module.
    pub fn parse(&mut self, path: &Path, rel_dir: &str, source: &str) -> Result<SourceFile, FrontendError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| FrontendError::Parse {
                path: path.to_path_buf(),
            })?;
        let root = tree.root_node();

        if root.has_error() {
            let at = first_error(root).unwrap_or(root);
            let position = at.start_position();
            return Err(FrontendError::Syntax {
                path: path.to_path_buf(),
                line: position.row + 1,
                column: position.column + 1,
            });
        }

        let lower = Lower { src: source };
        let mut file = SourceFile {
            path: path.to_path_buf(),
            rel_dir: rel_dir.to_string(),
            ..SourceFile::default()
        };

        // Comments seen since the last declaration, reset on blank lines.
        let mut pending: Vec<Node<'_>> = Vec::new();
        let mut last_code_row: Option<usize> = None;

        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            if node.kind() == "comment" {
                let row = node.start_position().row;
                if last_code_row == Some(row) {
                    // Trailing comment of the previous declaration.
                    pending.clear();
                    continue;
                }
                let adjacent = pending
                    .last()
                    .is_none_or(|prev| prev.end_position().row + 1 >= row);
                if !adjacent {
                    pending.clear();
                }
                pending.push(node);
                continue;
            }

            let doc = match pending.last() {
                Some(last) if last.end_position().row + 1 == node.start_position().row => {
                    pending.iter().map(|c| lower.text(*c).to_string()).collect()
                }
                _ => Vec::new(),
            };
            pending.clear();
            last_code_row = Some(node.end_position().row);

            match node.kind() {
                "package_clause" => {
                    if let Some(name) = node.named_child(0) {
                        file.unit = lower.text(name).to_string();
                    }
                }
                "import_declaration" => lower.imports(node, &mut file.imports),
                "type_declaration" => lower.type_decls(node, &mut file.types),
                "function_declaration" | "method_declaration" => {
                    if let Some(func) = lower.func_decl(node, doc) {
                        file.functions.push(func);
                    }
                }
                _ => {}
            }
        }

        if file.unit.is_empty() {
            return Err(FrontendError::MissingPackage {
                path: path.to_path_buf(),
            });
        }

        Ok(file)
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

struct Lower<'s> {
    src: &'s str,
}

impl<'s> Lower<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        self.src.get(node.byte_range()).unwrap_or_default()
    }

    fn field_text(&self, node: Node<'_>, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|child| self.text(child).to_string())
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn imports(&self, node: Node<'_>, out: &mut Vec<ImportSpec>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => {
                    let Some(path) = child.child_by_field_name("path") else {
                        continue;
                    };
                    out.push(ImportSpec {
                        alias: self.field_text(child, "name"),
                        path: unquote(self.text(path)).to_string(),
                    });
                }
                "import_spec_list" => self.imports(child, out),
                _ => {}
            }
        }
    }

    fn type_decls(&self, node: Node<'_>, out: &mut Vec<TypeDecl>) {
        let mut cursor = node.walk();
        for spec in node.named_children(&mut cursor) {
            let alias = match spec.kind() {
                "type_spec" => false,
                "type_alias" => true,
                _ => continue,
            };
            let (Some(name), Some(ty)) = (
                self.field_text(spec, "name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            out.push(TypeDecl {
                name,
                alias,
                ty: self.type_expr(ty),
            });
        }
    }

    fn func_decl(&self, node: Node<'_>, doc: Vec<String>) -> Option<FuncDecl> {
        let name = self.field_text(node, "name")?;
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|list| self.param_list(list).into_iter().next());
        let params = node
            .child_by_field_name("parameters")
            .map(|list| self.param_list(list))
            .unwrap_or_default();
        let results = self.results(node);

        Some(FuncDecl {
            name,
            doc,
            receiver,
            params,
            results,
        })
    }

    // =========================================================================
    // Signatures
    // =========================================================================

    fn param_list(&self, list: Node<'_>) -> Vec<FieldGroup> {
        let mut groups = Vec::new();
        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            let variadic = match decl.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => continue,
            };
            let Some(ty) = decl.child_by_field_name("type") else {
                continue;
            };
            let mut ty = self.type_expr(ty);
            if variadic {
                ty = TypeExpr::Variadic(Box::new(ty));
            }

            let mut names_cursor = decl.walk();
            let names: Vec<String> = decl
                .children_by_field_name("name", &mut names_cursor)
                .map(|name| self.text(name).to_string())
                .collect();
            groups.push(FieldGroup::named(names, ty));
        }
        groups
    }

    /// Result list of a function declaration, method element or function type.
    fn results(&self, node: Node<'_>) -> Vec<FieldGroup> {
        match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.param_list(result),
            Some(result) => vec![FieldGroup::unnamed(self.type_expr(result))],
            None => Vec::new(),
        }
    }

    fn signature(&self, node: Node<'_>) -> FuncSig {
        FuncSig {
            params: node
                .child_by_field_name("parameters")
                .map(|list| self.param_list(list))
                .unwrap_or_default(),
            results: self.results(node),
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn type_expr(&self, node: Node<'_>) -> TypeExpr {
        match node.kind() {
            "type_identifier" | "identifier" => TypeExpr::name(self.text(node)),
            "qualified_type" => match (
                self.field_text(node, "package"),
                self.field_text(node, "name"),
            ) {
                (Some(package), Some(name)) => TypeExpr::qualified(package, name),
                _ => unsupported(node),
            },
            "pointer_type" => self.wrapped(node, TypeExpr::pointer),
            "parenthesized_type" => match node.named_child(0) {
                Some(inner) => self.type_expr(inner),
                None => unsupported(node),
            },
            "slice_type" => match node.child_by_field_name("element") {
                Some(elem) => TypeExpr::slice(self.type_expr(elem)),
                None => unsupported(node),
            },
            "array_type" => match (
                node.child_by_field_name("length"),
                node.child_by_field_name("element"),
            ) {
                (Some(len), Some(elem)) => TypeExpr::Array {
                    len: self.array_len(len),
                    elem: Box::new(self.type_expr(elem)),
                },
                _ => unsupported(node),
            },
            "map_type" => match (
                node.child_by_field_name("key"),
                node.child_by_field_name("value"),
            ) {
                (Some(key), Some(value)) => TypeExpr::map(self.type_expr(key), self.type_expr(value)),
                _ => unsupported(node),
            },
            "channel_type" => match node.child_by_field_name("value") {
                Some(value) => TypeExpr::Chan {
                    dir: chan_dir(node),
                    elem: Box::new(self.type_expr(value)),
                },
                None => unsupported(node),
            },
            "function_type" => TypeExpr::Func(self.signature(node)),
            "struct_type" => TypeExpr::Struct {
                fields: self.struct_fields(node),
            },
            "interface_type" => TypeExpr::Interface {
                elems: self.interface_elems(node),
            },
            _ => unsupported(node),
        }
    }

    fn wrapped(&self, node: Node<'_>, wrap: fn(TypeExpr) -> TypeExpr) -> TypeExpr {
        match node.named_child(0) {
            Some(inner) => wrap(self.type_expr(inner)),
            None => unsupported(node),
        }
    }

    fn array_len(&self, node: Node<'_>) -> ArrayLen {
        match node.kind() {
            "int_literal" => ArrayLen::Literal(self.text(node).to_string()),
            "identifier" => ArrayLen::Expr(Box::new(TypeExpr::name(self.text(node)))),
            "selector_expression" => match (
                self.field_text(node, "operand"),
                self.field_text(node, "field"),
            ) {
                (Some(package), Some(name)) => {
                    ArrayLen::Expr(Box::new(TypeExpr::qualified(package, name)))
                }
                _ => ArrayLen::Expr(Box::new(unsupported(node))),
            },
            _ => ArrayLen::Expr(Box::new(unsupported(node))),
        }
    }

    fn struct_fields(&self, node: Node<'_>) -> Vec<FieldGroup> {
        let mut fields = Vec::new();
        let mut cursor = node.walk();
        let Some(list) = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "field_declaration_list")
        else {
            return fields;
        };

        let mut list_cursor = list.walk();
        for decl in list.named_children(&mut list_cursor) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let Some(ty) = decl.child_by_field_name("type") else {
                continue;
            };
            let mut names_cursor = decl.walk();
            let names: Vec<String> = decl
                .children_by_field_name("name", &mut names_cursor)
                .map(|name| self.text(name).to_string())
                .collect();

            let mut ty = self.type_expr(ty);
            if names.is_empty() && embeds_pointer(decl) {
                ty = TypeExpr::pointer(ty);
            }

            let mut group = FieldGroup::named(names, ty);
            group.tag = self.field_text(decl, "tag");
            fields.push(group);
        }
        fields
    }

    fn interface_elems(&self, node: Node<'_>) -> Vec<InterfaceElem> {
        let mut elems = Vec::new();
        let mut cursor = node.walk();
        for elem in node.named_children(&mut cursor) {
            match elem.kind() {
                "method_elem" | "method_spec" => {
                    if let Some(name) = self.field_text(elem, "name") {
                        elems.push(InterfaceElem::Method {
                            name,
                            sig: self.signature(elem),
                        });
                    }
                }
                "type_elem" | "constraint_elem" => {
                    let mut elem_cursor = elem.walk();
                    let types: Vec<Node<'_>> = elem.named_children(&mut elem_cursor).collect();
                    let ty = match types.as_slice() {
                        [single] => self.type_expr(*single),
                        _ => unsupported(elem),
                    };
                    elems.push(InterfaceElem::Embedded(ty));
                }
                "comment" => {}
                _ => elems.push(InterfaceElem::Embedded(self.type_expr(elem))),
            }
        }
        elems
    }
}

fn unsupported(node: Node<'_>) -> TypeExpr {
    TypeExpr::Unsupported {
        kind: node.kind().to_string(),
    }
}

/// Direction from the token order: `chan<- T`, `<-chan T` or `chan T`.
fn chan_dir(node: Node<'_>) -> ChanDir {
    let mut cursor = node.walk();
    let tokens: Vec<&str> = node
        .children(&mut cursor)
        .filter(|child| !child.is_named())
        .map(|child| child.kind())
        .collect();
    match tokens.as_slice() {
        ["<-", "chan", ..] => ChanDir::Recv,
        ["chan", "<-", ..] => ChanDir::Send,
        _ => ChanDir::Both,
    }
}

fn embeds_pointer(decl: Node<'_>) -> bool {
    let mut cursor = decl.walk();
    decl.children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == "*")
}

fn unquote(literal: &str) -> &str {
    literal.trim_matches(|c| c == '"' || c == '`')
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ir::Catalog;
    use crate::ir::render::render;

    fn parse(src: &str) -> SourceFile {
        GoParser::new()
            .unwrap()
            .parse(Path::new("svc/svc.go"), "svc", src)
            .unwrap()
    }

    fn func<'a>(file: &'a SourceFile, name: &str) -> &'a FuncDecl {
        file.functions.iter().find(|f| f.name == name).unwrap()
    }

    fn rendered(src: &str, type_name: &str) -> String {
        let file = parse(src);
        let decl = file.types.iter().find(|t| t.name == type_name).unwrap();
        render(&decl.ty, &Catalog::default())
    }

    #[test]
    fn test_package_and_imports() {
        let file = parse(
            r#"package svc

import "fmt"

import (
	u "github.com/google/uuid"
	_ "embed"
	"strings"
)
"#,
        );
        assert_eq!(file.unit, "svc");
        assert_eq!(file.rel_dir, "svc");
        let imports: Vec<_> = file
            .imports
            .iter()
            .map(|i| (i.alias.as_deref(), i.path.as_str()))
            .collect();
        assert_eq!(
            imports,
            vec![
                (None, "fmt"),
                (Some("u"), "github.com/google/uuid"),
                (Some("_"), "embed"),
                (None, "strings"),
            ]
        );
    }

    #[test]
    fn test_type_declarations() {
        let file = parse(
            r#"package svc

type Product struct {
	ID   int    `json:"id"`
	Name string `json:"name"`
}

type Alias = Product

type (
	Store interface{ Get(id int) Product }
	IDs   []int
)
"#,
        );
        let kinds: Vec<_> = file
            .types
            .iter()
            .map(|t| (t.name.as_str(), t.alias, t.ty.is_struct()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("Product", false, true),
                ("Alias", true, false),
                ("Store", false, false),
                ("IDs", false, false),
            ]
        );
    }

    #[test]
    fn test_doc_comment_groups() {
        let file = parse(
            r#"package svc

// Unrelated note.

// List returns everything.
// @server path=/items method=GET
func List() []string { return nil }

func Bare() {} // @server path=/bare method=GET

func After() {}

/* @server path=/block method=POST */
func Block() {}
"#,
        );
        assert_eq!(
            func(&file, "List").doc,
            vec![
                "// List returns everything.".to_string(),
                "// @server path=/items method=GET".to_string()
            ]
        );
        assert!(func(&file, "Bare").doc.is_empty());
        assert!(func(&file, "After").doc.is_empty());
        assert_eq!(
            func(&file, "Block").doc,
            vec!["/* @server path=/block method=POST */".to_string()]
        );
    }

    #[test]
    fn test_function_signatures() {
        let file = parse(
            r#"package svc

func (s *Service) Update(a, b int, names ...string) (n int, err error) { return 0, nil }

func Plain(int, string) {}
"#,
        );
        let update = func(&file, "Update");
        let receiver = update.receiver.as_ref().unwrap();
        assert_eq!(receiver.names, vec!["s".to_string()]);
        assert_eq!(receiver.ty.base_name(), Some("Service"));

        let params: Vec<_> = update
            .params
            .iter()
            .map(|g| (g.names.clone(), render(&g.ty, &Catalog::default())))
            .collect();
        assert_eq!(
            params,
            vec![
                (vec!["a".to_string(), "b".to_string()], "int".to_string()),
                (vec!["names".to_string()], "...string".to_string()),
            ]
        );
        assert_eq!(update.results.len(), 2);
        assert_eq!(update.results[0].names, vec!["n".to_string()]);

        let plain = func(&file, "Plain");
        assert!(plain.receiver.is_none());
        assert_eq!(plain.params.len(), 2);
        assert!(plain.params.iter().all(|g| g.names.is_empty()));
        assert!(plain.results.is_empty());
    }

    #[test]
    fn test_type_shapes_round_trip_through_renderer() {
        let src = r#"package svc

type Shapes struct {
	A *[]map[string]int
	B [4]byte
	C [limits.Max]byte
	D chan<- int
	E <-chan int
	F chan int
	G func(int, string) (bool, error)
	H interface{}
	I struct{}
	*Embedded
	fmt.Stringer
}
"#;
        assert_eq!(
            rendered(src, "Shapes"),
            "struct{A *[]map[string]int\nB [4]byte\nC [limits.Max]byte\nD chan<- int\nE <-chan int\nF chan int\nG func(int, string) (bool, error)\nH interface{}\nI struct{}\n*Embedded\nfmt.Stringer}"
        );
    }

    #[test]
    fn test_generic_types_are_unsupported() {
        let src = "package svc\n\ntype Page struct {\n\tItems List[int]\n}\n";
        assert_eq!(rendered(src, "Page"), "struct{Items #unsupported(generic_type)}");
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = GoParser::new()
            .unwrap()
            .parse(Path::new("bad.go"), "", "package svc\n\nfunc Broken( {\n")
            .unwrap_err();
        assert!(matches!(err, FrontendError::Syntax { line, .. } if line >= 3));
    }

    #[test]
    fn test_missing_package_clause() {
        let err = GoParser::new()
            .unwrap()
            .parse(Path::new("empty.go"), "", "")
            .unwrap_err();
        assert!(matches!(err, FrontendError::MissingPackage { .. }));
    }
}
