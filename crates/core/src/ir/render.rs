//! Type Descriptor Renderer.
//!
//! Turns a type expression into its canonical, re-parseable string form,
//! qualifying bare names that the catalog knows with their owning unit.
//! Rendering is pure: the same expression and catalog always yield the same
//! string, which is what keeps the server and client artifacts in agreement.

use std::collections::BTreeSet;

use super::catalog::Catalog;
use crate::syntax::{ArrayLen, ChanDir, FieldGroup, FuncSig, InterfaceElem, TypeExpr};

const UNSUPPORTED_PREFIX: &str = "#unsupported(";

/// Render a type expression to its descriptor string.
pub fn render(expr: &TypeExpr, catalog: &Catalog) -> String {
    let mut out = String::new();
    render_into(expr, catalog, &mut out);
    out
}

/// Whether a descriptor contains a shape the renderer could not express.
pub fn is_unsupported(descriptor: &str) -> bool {
    descriptor.contains(UNSUPPORTED_PREFIX)
}

/// Package qualifier a rendered descriptor depends on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Reference {
    /// Catalogued aggregate, rendered as `<unit>.<name>`
    Aggregate(String),
    /// Explicit `package.Name` written in source
    Package(String),
}

/// Collect every package qualifier `render` would emit for this expression.
pub fn references(expr: &TypeExpr, catalog: &Catalog) -> BTreeSet<Reference> {
    let mut refs = BTreeSet::new();
    collect_references(expr, catalog, &mut refs);
    refs
}

fn render_into(expr: &TypeExpr, catalog: &Catalog, out: &mut String) {
    match expr {
        TypeExpr::Name(name) => {
            if let Some(unit) = catalog.lookup(name) {
                out.push_str(unit);
                out.push('.');
            }
            out.push_str(name);
        }
        TypeExpr::Pointer(inner) => {
            out.push('*');
            render_into(inner, catalog, out);
        }
        TypeExpr::Qualified { package, name } => {
            out.push_str(package);
            out.push('.');
            out.push_str(name);
        }
        TypeExpr::Slice(elem) => {
            out.push_str("[]");
            render_into(elem, catalog, out);
        }
        TypeExpr::Array { len, elem } => {
            out.push('[');
            match len {
                ArrayLen::Literal(value) => out.push_str(value),
                ArrayLen::Expr(len) => render_into(len, catalog, out),
            }
            out.push(']');
            render_into(elem, catalog, out);
        }
        TypeExpr::Map { key, value } => {
            out.push_str("map[");
            render_into(key, catalog, out);
            out.push(']');
            render_into(value, catalog, out);
        }
        TypeExpr::Struct { fields } => {
            if fields.is_empty() {
                out.push_str("struct{}");
                return;
            }
            out.push_str("struct{");
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                if !field.names.is_empty() {
                    out.push_str(&field.names.join(", "));
                    out.push(' ');
                }
                render_into(&field.ty, catalog, out);
                if let Some(tag) = &field.tag {
                    out.push(' ');
                    out.push_str(tag);
                }
            }
            out.push('}');
        }
        TypeExpr::Interface { elems } => {
            if elems.is_empty() {
                out.push_str("interface{}");
                return;
            }
            out.push_str("interface{");
            for (i, elem) in elems.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                match elem {
                    InterfaceElem::Method { name, sig } => {
                        out.push_str(name);
                        render_signature(sig, catalog, out);
                    }
                    InterfaceElem::Embedded(ty) => {
                        out.push(' ');
                        render_into(ty, catalog, out);
                    }
                }
            }
            out.push('}');
        }
        TypeExpr::Func(sig) => {
            out.push_str("func");
            render_signature(sig, catalog, out);
        }
        TypeExpr::Variadic(elem) => {
            out.push_str("...");
            render_into(elem, catalog, out);
        }
        TypeExpr::Chan { dir, elem } => {
            out.push_str(match dir {
                ChanDir::Send => "chan<- ",
                ChanDir::Recv => "<-chan ",
                ChanDir::Both => "chan ",
            });
            render_into(elem, catalog, out);
        }
        TypeExpr::Unsupported { kind } => {
            out.push_str(UNSUPPORTED_PREFIX);
            out.push_str(kind);
            out.push(')');
        }
    }
}

/// `(<params>)` followed by the result list, as written after `func`.
fn render_signature(sig: &FuncSig, catalog: &Catalog, out: &mut String) {
    out.push('(');
    render_type_list(&sig.params, catalog, out);
    out.push(')');

    match sig.results.as_slice() {
        [] => {}
        [single] if single.names.is_empty() => {
            out.push(' ');
            render_into(&single.ty, catalog, out);
        }
        results => {
            out.push_str(" (");
            render_type_list(results, catalog, out);
            out.push(')');
        }
    }
}

/// One rendered type per declared value, names expanded, comma separated.
fn render_type_list(groups: &[FieldGroup], catalog: &Catalog, out: &mut String) {
    let mut first = true;
    for group in groups {
        for _ in 0..group.arity() {
            if !first {
                out.push_str(", ");
            }
            first = false;
            render_into(&group.ty, catalog, out);
        }
    }
}

fn collect_references(expr: &TypeExpr, catalog: &Catalog, refs: &mut BTreeSet<Reference>) {
    match expr {
        TypeExpr::Name(name) => {
            if catalog.lookup(name).is_some() {
                refs.insert(Reference::Aggregate(name.clone()));
            }
        }
        TypeExpr::Qualified { package, .. } => {
            refs.insert(Reference::Package(package.clone()));
        }
        TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) | TypeExpr::Variadic(inner) => {
            collect_references(inner, catalog, refs);
        }
        TypeExpr::Chan { elem, .. } => collect_references(elem, catalog, refs),
        TypeExpr::Array { len, elem } => {
            if let ArrayLen::Expr(len) = len {
                collect_references(len, catalog, refs);
            }
            collect_references(elem, catalog, refs);
        }
        TypeExpr::Map { key, value } => {
            collect_references(key, catalog, refs);
            collect_references(value, catalog, refs);
        }
        TypeExpr::Struct { fields } => {
            for field in fields {
                collect_references(&field.ty, catalog, refs);
            }
        }
        TypeExpr::Interface { elems } => {
            for elem in elems {
                match elem {
                    InterfaceElem::Method { sig, .. } => collect_signature(sig, catalog, refs),
                    InterfaceElem::Embedded(ty) => collect_references(ty, catalog, refs),
                }
            }
        }
        TypeExpr::Func(sig) => collect_signature(sig, catalog, refs),
        TypeExpr::Unsupported { .. } => {}
    }
}

fn collect_signature(sig: &FuncSig, catalog: &Catalog, refs: &mut BTreeSet<Reference>) {
    for group in sig.params.iter().chain(&sig.results) {
        collect_references(&group.ty, catalog, refs);
    }
}
