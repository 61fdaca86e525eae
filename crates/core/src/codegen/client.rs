//! Client artifact: one typed call per route, using the same verb and path
//! literals as the server so both sides agree on the wire.

use std::collections::BTreeSet;

use super::GENERATED_HEADER;
use super::go::{GoConst, GoDecl, GoExpr, GoField, GoFile, GoFunc, GoImport, GoParam, GoStmt, GoStruct};
use super::plan::{Outcome, Plan, RUNTIME_PACKAGE};
use super::utils::Scope;
use crate::ir::RouteDescriptor;

const CLIENT_TYPE: &str = "Client";
/// Field holding the shared runtime client.
const RUNTIME_FIELD: &str = "rt";

/// Build the client package named `package`, defaulting to `endpoint`.
pub fn client_file(plan: &Plan<'_>, package: &str, endpoint: &str) -> GoFile {
    let names: BTreeSet<&str> = plan
        .routes()
        .flat_map(|route| route.imports.iter().map(|i| i.name.as_str()))
        .collect();

    let mut imports = vec![GoImport::new(RUNTIME_PACKAGE)];
    imports.extend(plan.go_imports(names.iter().copied()));
    let scope = Scope::new(names.iter().copied().chain([RUNTIME_PACKAGE]));

    let mut decls = vec![
        GoDecl::Const(GoConst {
            doc: Some("DefaultEndpoint is where the generated server listens by default.".to_string()),
            name: "DefaultEndpoint".to_string(),
            value: GoExpr::str(endpoint),
        }),
        GoDecl::Struct(GoStruct {
            doc: Some(format!("{CLIENT_TYPE} calls the routes of the generated server.")),
            name: CLIENT_TYPE.to_string(),
            fields: std::iter::once(GoField {
                name: RUNTIME_FIELD.to_string(),
                ty: format!("*{RUNTIME_PACKAGE}.Client"),
            })
            .chain(plan.groups.iter().map(|group| GoField {
                name: group.aggregate.to_string(),
                ty: format!("*{}", accessor_type(group.aggregate)),
            }))
            .collect(),
        }),
        GoDecl::Func(constructor(plan)),
        GoDecl::Func(GoFunc {
            doc: Some("NewDefault returns a client for DefaultEndpoint.".to_string()),
            receiver: None,
            name: "NewDefault".to_string(),
            params: vec![],
            results: vec![format!("*{CLIENT_TYPE}")],
            body: vec![GoStmt::Return(vec![
                GoExpr::ident("New").call(vec![GoExpr::ident("DefaultEndpoint")]),
            ])],
        }),
    ];

    for route in &plan.standalone {
        decls.push(GoDecl::Func(call(route, CLIENT_TYPE, scope.clone())));
    }

    for group in &plan.groups {
        let accessor = accessor_type(group.aggregate);
        decls.push(GoDecl::Struct(GoStruct {
            doc: Some(format!(
                "{accessor} calls the routes of {}.{}.",
                group.unit, group.aggregate
            )),
            name: accessor.clone(),
            fields: vec![GoField {
                name: RUNTIME_FIELD.to_string(),
                ty: format!("*{RUNTIME_PACKAGE}.Client"),
            }],
        }));
        for route in &group.routes {
            decls.push(GoDecl::Func(call(route, &accessor, scope.clone())));
        }
    }

    GoFile {
        header: vec![GENERATED_HEADER.to_string()],
        package: package.to_string(),
        imports,
        decls,
    }
}

fn accessor_type(aggregate: &str) -> String {
    format!("{aggregate}Client")
}

/// `New(endpoint)` wires every accessor to one runtime client.
fn constructor(plan: &Plan<'_>) -> GoFunc {
    let rt = GoExpr::ident(RUNTIME_FIELD);
    let fields = std::iter::once((RUNTIME_FIELD.to_string(), rt.clone()))
        .chain(plan.groups.iter().map(|group| {
            let accessor = GoExpr::Composite {
                ty: accessor_type(group.aggregate),
                fields: vec![(RUNTIME_FIELD.to_string(), rt.clone())],
            };
            (group.aggregate.to_string(), accessor.addr_of())
        }))
        .collect();

    GoFunc {
        doc: Some("New returns a client for the server at endpoint.".to_string()),
        receiver: None,
        name: "New".to_string(),
        params: vec![GoParam::new("endpoint", "string")],
        results: vec![format!("*{CLIENT_TYPE}")],
        body: vec![
            GoStmt::define(
                RUNTIME_FIELD,
                GoExpr::qualified(RUNTIME_PACKAGE, "NewClient").call(vec![GoExpr::ident("endpoint")]),
            ),
            GoStmt::Return(vec![
                GoExpr::Composite {
                    ty: CLIENT_TYPE.to_string(),
                    fields,
                }
                .addr_of(),
            ]),
        ],
    }
}

fn call(route: &RouteDescriptor, owner: &str, mut scope: Scope) -> GoFunc {
    // Parameters keep their names unless one would hide an imported package.
    let locals: Vec<String> = route.parameters.iter().map(|p| scope.bind(&p.name)).collect();
    let c = scope.bind("c");
    let args = scope.bind("args");
    let err = scope.bind("err");
    let result = scope.bind("result");

    let outcome = Outcome::of(route);
    let value = outcome.value();

    // Early returns carry the zero result alongside the error.
    let fail = || {
        let mut values: Vec<GoExpr> = value.map(|_| GoExpr::ident(&result)).into_iter().collect();
        values.push(GoExpr::ident(&err));
        vec![GoStmt::Return(values)]
    };

    let mut body = Vec::new();
    if let Some(ty) = value {
        body.push(GoStmt::Var {
            name: result.clone(),
            ty: ty.to_string(),
        });
    }
    body.push(GoStmt::define(
        &args,
        GoExpr::qualified(RUNTIME_PACKAGE, "NewArgs").call(vec![]),
    ));
    for (param, local) in route.parameters.iter().zip(&locals) {
        body.push(GoStmt::if_err(
            &err,
            GoExpr::qualified(&args, "Set").call(vec![GoExpr::str(&param.name), GoExpr::ident(local)]),
            fail(),
        ));
    }

    let out = match value {
        Some(_) => GoExpr::ident(&result).addr_of(),
        None => GoExpr::Nil,
    };
    let invoke = GoExpr::ident(&c).select(RUNTIME_FIELD).select("Call").call(vec![
        GoExpr::str(&route.verb),
        GoExpr::str(&route.path),
        GoExpr::ident(&args),
        out,
    ]);

    let results = match value {
        Some(ty) => {
            body.push(GoStmt::define(&err, invoke));
            body.push(GoStmt::Return(vec![GoExpr::ident(&result), GoExpr::ident(&err)]));
            vec![ty.to_string(), "error".to_string()]
        }
        None => {
            body.push(GoStmt::Return(vec![invoke]));
            vec!["error".to_string()]
        }
    };

    GoFunc {
        doc: Some(format!("{} calls {} {}.", route.name, route.verb, route.path)),
        receiver: Some(GoParam::new(c, format!("*{owner}"))),
        name: route.name.clone(),
        params: route
            .parameters
            .iter()
            .zip(locals)
            .map(|(p, local)| GoParam::new(local, &p.ty))
            .collect(),
        results,
        body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::codegen::emit::Emit;
    use crate::codegen::plan::tests::{method, route};
    use crate::codegen::server::server_file;
    use crate::ir::{Import, IrBundle, Parameter};

    fn bundle(routes: Vec<RouteDescriptor>) -> IrBundle {
        IrBundle::new("example.com/app", routes)
    }

    fn emit(routes: Vec<RouteDescriptor>) -> String {
        let bundle = bundle(routes);
        let plan = Plan::new(&bundle).unwrap();
        client_file(&plan, "client", "http://localhost:8080").emit()
    }

    fn shop_import() -> Import {
        Import {
            name: "shop".into(),
            path: "example.com/app/shop".into(),
        }
    }

    #[test]
    fn test_client_skeleton() {
        let out = emit(vec![method("shop", "Cart", "Clear", "DELETE", "/cart")]);
        assert!(out.starts_with("// Code generated by vertex. DO NOT EDIT.\n\npackage client\n\nimport (\n\t\"vertex\"\n)\n"));
        assert!(out.contains("const DefaultEndpoint = \"http://localhost:8080\"\n"));
        assert!(out.contains("type Client struct {\n\trt *vertex.Client\n\tCart *CartClient\n}\n"));
        assert!(out.contains("\trt := vertex.NewClient(endpoint)\n\treturn &Client{rt: rt, Cart: &CartClient{rt: rt}}\n"));
        assert!(out.contains("func NewDefault() *Client {\n\treturn New(DefaultEndpoint)\n}\n"));
        assert!(out.contains("type CartClient struct {\n\trt *vertex.Client\n}\n"));
        // The receiver's package is not needed by a method without typed values.
        assert!(!out.contains("example.com/app/shop"));
        assert!(out.contains(
            "// Clear calls DELETE /cart.\nfunc (c *CartClient) Clear() error {\n\targs := vertex.NewArgs()\n\treturn c.rt.Call(\"DELETE\", \"/cart\", args, nil)\n}\n"
        ));
    }

    #[test]
    fn test_method_with_parameters_and_result() {
        let mut list = method("shop", "Cart", "Items", "GET", "/cart/items");
        list.parameters = vec![Parameter {
            name: "limit".into(),
            ty: "int".into(),
        }];
        list.return_type = "[]shop.Item".into();
        list.is_slice = true;
        list.result_count = 2;
        list.returns_error = true;
        list.imports.insert(shop_import());

        let out = emit(vec![list]);
        assert!(out.contains("\t\"vertex\"\n\n\t\"example.com/app/shop\"\n"));
        assert!(out.contains(
            "func (c *CartClient) Items(limit int) ([]shop.Item, error) {\n\tvar result []shop.Item\n\targs := vertex.NewArgs()\n\tif err := args.Set(\"limit\", limit); err != nil {\n\t\treturn result, err\n\t}\n\terr := c.rt.Call(\"GET\", \"/cart/items\", args, &result)\n\treturn result, err\n}\n"
        ));
    }

    #[test]
    fn test_standalone_calls_hang_off_client() {
        let mut health = route("api", "Health", "GET", "/health");
        health.return_type = "string".into();
        health.result_count = 1;

        let out = emit(vec![health]);
        assert!(out.contains("type Client struct {\n\trt *vertex.Client\n}\n"));
        assert!(out.contains("\treturn &Client{rt: rt}\n"));
        assert!(out.contains("func (c *Client) Health() (string, error) {\n"));
    }

    #[test]
    fn test_locals_avoid_parameter_names() {
        let mut odd = route("api", "Odd", "POST", "/odd");
        odd.parameters = vec![
            Parameter {
                name: "c".into(),
                ty: "int".into(),
            },
            Parameter {
                name: "args".into(),
                ty: "...string".into(),
            },
        ];
        odd.return_type = "error".into();
        odd.result_count = 1;

        let out = emit(vec![odd]);
        assert!(out.contains("func (c1 *Client) Odd(c int, args ...string) error {\n\targs1 := vertex.NewArgs()\n"));
        assert!(out.contains("\tif err := args1.Set(\"args\", args); err != nil {\n\t\treturn err\n\t}\n"));
        assert!(out.contains("\treturn c1.rt.Call(\"POST\", \"/odd\", args1, nil)\n"));
    }

    #[test]
    fn test_parameter_named_like_a_package_is_renamed() {
        let mut put = method("shop", "Cart", "Put", "PUT", "/cart");
        put.parameters = vec![Parameter {
            name: "shop".into(),
            ty: "shop.Item".into(),
        }];
        put.imports.insert(shop_import());

        let out = emit(vec![put]);
        assert!(out.contains("func (c *CartClient) Put(shop1 shop.Item) error {\n"));
        assert!(out.contains("args.Set(\"shop\", shop1)"));
    }

    #[test]
    fn test_both_artifacts_use_identical_route_literals() {
        let routes = vec![
            method("shop", "Cart", "Add", "POST", "/cart"),
            route("api", "Search", "GET", "/search?mode=full"),
            route("api", "Purge", "delete", "/cache"),
        ];
        let bundle = bundle(routes);
        let plan = Plan::new(&bundle).unwrap();
        let server = server_file(&plan, 8080).emit();
        let client = client_file(&plan, "client", "http://localhost:8080").emit();

        for route in bundle.routes() {
            let literals = format!("\"{}\", \"{}\"", route.verb, route.path);
            assert!(server.contains(&format!("vertex.Pattern({literals})")), "{literals}");
            assert!(client.contains(&format!("c.rt.Call({literals}, args")), "{literals}");
        }
    }
}
