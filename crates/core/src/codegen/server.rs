//! Server artifact: a `main` package exposing every route on one ServeMux.
//!
//! Each aggregate gets a `register<Aggregate>` function that binds its methods
//! to a single shared instance. Standalone routes are bound by `registerRoutes`.

use std::collections::BTreeSet;

use super::GENERATED_HEADER;
use super::go::{GoDecl, GoExpr, GoFile, GoFunc, GoImport, GoParam, GoStmt};
use super::plan::{Group, Outcome, Plan, RUNTIME_PACKAGE};
use super::utils::Scope;
use crate::ir::RouteDescriptor;

const STANDALONE_REGISTRATION: &str = "registerRoutes";

/// Build the server `main` package, listening on `listen_port` by default.
pub fn server_file(plan: &Plan<'_>, listen_port: u16) -> GoFile {
    let names: BTreeSet<&str> = plan
        .routes()
        .flat_map(|route| {
            std::iter::once(route.unit_name.as_str()).chain(route.imports.iter().map(|i| i.name.as_str()))
        })
        .collect();

    let mut imports = vec![GoImport::new("flag"), GoImport::new("log"), GoImport::new("net/http")];
    if plan.routes().next().is_some() {
        imports.push(GoImport::new(RUNTIME_PACKAGE));
    }
    imports.extend(plan.go_imports(names.iter().copied()));

    // Locals never shadow a package the file refers to.
    let scope = Scope::new(
        names
            .iter()
            .copied()
            .chain(["flag", "log", "http", RUNTIME_PACKAGE]),
    );

    let mut decls = vec![GoDecl::Func(main_func(plan, listen_port, scope.clone()))];
    for group in &plan.groups {
        decls.push(GoDecl::Func(group_registration(group, scope.clone())));
    }
    if !plan.standalone.is_empty() {
        decls.push(GoDecl::Func(standalone_registration(&plan.standalone, scope)));
    }

    GoFile {
        header: vec![GENERATED_HEADER.to_string()],
        package: "main".to_string(),
        imports,
        decls,
    }
}

fn runtime(name: &str) -> GoExpr {
    GoExpr::qualified(RUNTIME_PACKAGE, name)
}

fn registration_name(aggregate: &str) -> String {
    format!("register{aggregate}")
}

// =============================================================================
// main
// =============================================================================

fn main_func(plan: &Plan<'_>, listen_port: u16, mut scope: Scope) -> GoFunc {
    let addr = scope.bind("addr");
    let mux = scope.bind("mux");
    let err = scope.bind("err");

    let mut body = vec![
        GoStmt::define(
            &addr,
            GoExpr::qualified("flag", "String").call(vec![
                GoExpr::str("addr"),
                GoExpr::str(format!(":{listen_port}")),
                GoExpr::str("listen address"),
            ]),
        ),
        GoStmt::Expr(GoExpr::qualified("flag", "Parse").call(vec![])),
        GoStmt::Blank,
        GoStmt::define(&mux, GoExpr::qualified("http", "NewServeMux").call(vec![])),
    ];

    for group in &plan.groups {
        body.push(GoStmt::Expr(
            GoExpr::ident(registration_name(group.aggregate)).call(vec![GoExpr::ident(&mux), service_instance(group)]),
        ));
    }
    if !plan.standalone.is_empty() {
        body.push(GoStmt::Expr(
            GoExpr::ident(STANDALONE_REGISTRATION).call(vec![GoExpr::ident(&mux)]),
        ));
    }

    body.push(GoStmt::Blank);
    body.push(GoStmt::Expr(GoExpr::qualified("log", "Printf").call(vec![
        GoExpr::str("listening on %s"),
        GoExpr::ident(&addr).deref(),
    ])));
    body.push(GoStmt::if_err(
        &err,
        GoExpr::qualified("http", "ListenAndServe").call(vec![GoExpr::ident(&addr).deref(), GoExpr::ident(&mux)]),
        vec![GoStmt::Expr(
            GoExpr::qualified("log", "Fatal").call(vec![GoExpr::ident(&err)]),
        )],
    ));

    GoFunc {
        doc: None,
        receiver: None,
        name: "main".to_string(),
        params: vec![],
        results: vec![],
        body,
    }
}

/// The one instance every method of a group is called on.
fn service_instance(group: &Group<'_>) -> GoExpr {
    match group.constructor {
        Some(constructor) => {
            let call = GoExpr::qualified(group.unit, &constructor.name).call(vec![]);
            if constructor.returns_pointer {
                call
            } else {
                runtime("Ptr").call(vec![call])
            }
        }
        None => GoExpr::ident("new").call(vec![GoExpr::qualified(group.unit, group.aggregate)]),
    }
}

// =============================================================================
// Registrations
// =============================================================================

fn group_registration(group: &Group<'_>, mut scope: Scope) -> GoFunc {
    let mux = scope.bind("mux");
    let svc = scope.bind("svc");

    let body = group
        .routes
        .iter()
        .map(|route| handle(route, &mux, GoExpr::ident(&svc).select(&route.name), scope.clone()))
        .collect();

    GoFunc {
        doc: Some(format!(
            "{} serves the routes of {}.{}.",
            registration_name(group.aggregate),
            group.unit,
            group.aggregate
        )),
        receiver: None,
        name: registration_name(group.aggregate),
        params: vec![
            GoParam::new(mux, "*http.ServeMux"),
            GoParam::new(svc, format!("*{}.{}", group.unit, group.aggregate)),
        ],
        results: vec![],
        body,
    }
}

fn standalone_registration(routes: &[&RouteDescriptor], mut scope: Scope) -> GoFunc {
    let mux = scope.bind("mux");

    let body = routes
        .iter()
        .map(|route| {
            let callee = GoExpr::qualified(&route.unit_name, &route.name);
            handle(route, &mux, callee, scope.clone())
        })
        .collect();

    GoFunc {
        doc: Some(format!("{STANDALONE_REGISTRATION} serves the package-level routes.")),
        receiver: None,
        name: STANDALONE_REGISTRATION.to_string(),
        params: vec![GoParam::new(mux, "*http.ServeMux")],
        results: vec![],
        body,
    }
}

/// `mux.HandleFunc(vertex.Pattern(verb, path), func(w, r) { ... })`
fn handle(route: &RouteDescriptor, mux: &str, callee: GoExpr, scope: Scope) -> GoStmt {
    let pattern = runtime("Pattern").call(vec![GoExpr::str(&route.verb), GoExpr::str(&route.path)]);
    GoStmt::Expr(GoExpr::qualified(mux, "HandleFunc").call(vec![pattern, handler(route, callee, scope)]))
}

// =============================================================================
// Handler bodies
// =============================================================================

fn handler(route: &RouteDescriptor, callee: GoExpr, mut scope: Scope) -> GoExpr {
    let w = scope.bind("w");
    let r = scope.bind("r");
    let args = scope.bind("args");
    let err = scope.bind("err");
    let result = scope.bind("result");

    let fail = |status: &str| {
        vec![
            GoStmt::Expr(runtime("WriteError").call(vec![
                GoExpr::ident(&w),
                GoExpr::qualified("http", status),
                GoExpr::ident(&err),
            ])),
            GoStmt::Return(vec![]),
        ]
    };

    let mut body = Vec::new();
    let mut err_declared = false;
    let mut locals = Vec::new();

    if !route.parameters.is_empty() {
        body.push(GoStmt::Define {
            names: vec![args.clone(), err.clone()],
            value: runtime("ReadArgs").call(vec![GoExpr::ident(&r)]),
        });
        body.push(GoStmt::If {
            init: None,
            cond: GoExpr::ident(&err).not_nil(),
            body: fail("StatusBadRequest"),
        });
        err_declared = true;

        for param in &route.parameters {
            let local = scope.bind(&param.name);
            let ty = param
                .variadic_elem()
                .map_or_else(|| param.ty.clone(), |elem| format!("[]{elem}"));
            body.push(GoStmt::Var {
                name: local.clone(),
                ty,
            });
            body.push(GoStmt::if_err(
                &err,
                GoExpr::qualified(&args, "Decode").call(vec![GoExpr::str(&param.name), GoExpr::ident(&local).addr_of()]),
                fail("StatusBadRequest"),
            ));
            locals.push(GoExpr::ident(local));
        }
        body.push(GoStmt::Blank);
    }

    let spread = route.parameters.last().is_some_and(|p| p.variadic_elem().is_some());
    let call = GoExpr::Call {
        callee: Box::new(callee),
        args: locals,
        spread,
    };

    match Outcome::of(route) {
        Outcome::Nothing => {
            body.push(GoStmt::Expr(call));
            body.push(GoStmt::Expr(runtime("WriteEmpty").call(vec![GoExpr::ident(&w)])));
        }
        Outcome::Error => {
            body.push(GoStmt::if_err(&err, call, fail("StatusInternalServerError")));
            body.push(GoStmt::Expr(runtime("WriteEmpty").call(vec![GoExpr::ident(&w)])));
        }
        Outcome::Value { ty, fallible } => {
            body.push(GoStmt::Var {
                name: result.clone(),
                ty: ty.to_string(),
            });
            if fallible && !err_declared {
                body.push(GoStmt::Var {
                    name: err.clone(),
                    ty: "error".to_string(),
                });
            }

            // Results after the first are discarded, except a trailing error.
            let mut names = vec![result.clone()];
            names.resize(route.result_count.max(1), "_".to_string());
            if fallible {
                names.pop();
                names.push(err.clone());
            }
            body.push(GoStmt::Assign { names, value: call });

            if fallible {
                body.push(GoStmt::If {
                    init: None,
                    cond: GoExpr::ident(&err).not_nil(),
                    body: fail("StatusInternalServerError"),
                });
            }

            // WriteList is generic over slices only, arrays go through WriteResult.
            let writer = if route.is_slice && ty.starts_with("[]") {
                "WriteList"
            } else {
                "WriteResult"
            };
            body.push(GoStmt::Expr(
                runtime(writer).call(vec![GoExpr::ident(&w), GoExpr::ident(&result)]),
            ));
        }
    }

    GoExpr::FuncLit {
        params: vec![
            GoParam::new(w, "http.ResponseWriter"),
            GoParam::new(r, "*http.Request"),
        ],
        body,
    }
}
