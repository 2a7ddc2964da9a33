//! End-to-end tests over a real listener.

mod common;

use std::sync::{Arc, Mutex};

use axum::http::{header, StatusCode};
use strata::config::{parse_config, ServerConfig};
use strata::http::middleware::request_id;
use strata::http::X_REQUEST_ID;
use strata::{
    continuation, handler, middleware, raw, service, Group, HandlerRegistry, HttpError, Link,
    RequestHandler, Server,
};

type Trace = Arc<Mutex<Vec<String>>>;

fn tracing_layer(trace: &Trace, name: &'static str) -> strata::HandlerLike {
    let trace = Arc::clone(trace);
    middleware(move |next| {
        let trace = Arc::clone(&trace);
        RequestHandler::new(move |ctx| {
            trace.lock().unwrap().push(format!("{name}-pre"));
            let result = next.call(ctx);
            trace.lock().unwrap().push(format!("{name}-post"));
            result
        })
    })
}

fn local_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.server.name = "strata-test".into();
    config.transport.shutdown_grace_secs = 1;
    config
}

#[tokio::test(flavor = "multi_thread")]
async fn global_and_route_middleware_nest_like_a_stack() {
    let trace = Trace::default();
    let mut server = Server::new(local_config());
    server
        .use_middleware(vec![tracing_layer(&trace, "A")])
        .unwrap()
        .get(
            "/ok",
            vec![
                tracing_layer(&trace, "B"),
                tracing_layer(&trace, "C"),
                handler({
                    let trace = Arc::clone(&trace);
                    move |ctx| {
                        trace.lock().unwrap().push("h".into());
                        ctx.text("ok")
                    }
                }),
            ],
        )
        .unwrap()
        .get(
            "/fail",
            vec![
                tracing_layer(&trace, "B"),
                handler(|_| Err(HttpError::new(StatusCode::IM_A_TEAPOT, "no coffee"))),
            ],
        )
        .unwrap();

    let srv = common::spawn(server).await;
    let client = common::client();

    let res = client.get(srv.url("/ok")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "ok");
    assert_eq!(
        std::mem::take(&mut *trace.lock().unwrap()),
        ["A-pre", "B-pre", "C-pre", "h", "C-post", "B-post", "A-post"]
    );

    let res = client.get(srv.url("/fail")).send().await.unwrap();
    assert_eq!(res.status(), 418);
    assert_eq!(res.text().await.unwrap(), "no coffee");
    assert_eq!(
        *trace.lock().unwrap(),
        ["A-pre", "B-pre", "B-post", "A-post"]
    );

    srv.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_and_empty_routes_are_404_with_405_for_wrong_method() {
    let mut server = Server::new(local_config());
    server
        .get("/empty", vec![])
        .unwrap()
        .post("/things", vec![handler(|ctx| ctx.text("created"))])
        .unwrap();

    let srv = common::spawn(server).await;
    let client = common::client();

    for path in ["/empty", "/nowhere"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 404);
        assert_eq!(res.text().await.unwrap(), "Not Found");
    }

    let res = client.get(srv.url("/things")).send().await.unwrap();
    assert_eq!(res.status(), 405);
    assert_eq!(res.headers()[header::ALLOW], "POST");

    srv.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn errors_render_as_json_when_accepted() {
    let mut server = Server::new(local_config());
    server
        .get("/deny", vec![handler(|_| Err(HttpError::with_status(StatusCode::FORBIDDEN)))])
        .unwrap();

    let srv = common::spawn(server).await;
    let res = common::client()
        .get(srv.url("/deny"))
        .header(header::ACCEPT, "application/json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 403);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "code": 403, "message": "Forbidden" }));

    srv.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_handler_does_not_take_the_server_down() {
    let mut server = Server::new(local_config());
    server
        .get("/boom", vec![handler(|_| panic!("handler bug"))])
        .unwrap()
        .get("/fine", vec![handler(|ctx| ctx.text("fine"))])
        .unwrap();

    let srv = common::spawn(server).await;
    let client = common::client();

    let res = client.get(srv.url("/boom")).send().await.unwrap();
    assert_eq!(res.status(), 500);

    let res = client.get(srv.url("/fine")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    srv.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn get_only_rejects_other_methods() {
    let mut config = local_config();
    config.transport.get_only = true;
    let mut server = Server::new(config);
    server
        .post("/submit", vec![handler(|ctx| ctx.text("accepted"))])
        .unwrap();

    let srv = common::spawn(server).await;
    let res = common::client().post(srv.url("/submit")).send().await.unwrap();
    assert_eq!(res.status(), 405);

    srv.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_body_is_rejected() {
    let mut config = local_config();
    config.transport.max_request_body_size = 16;
    let mut server = Server::new(config);
    server
        .post(
            "/upload",
            vec![handler(|ctx| {
                let len = ctx.request()?.body().len();
                ctx.text(len.to_string())
            })],
        )
        .unwrap();

    let srv = common::spawn(server).await;
    let client = common::client();

    let res = client.post(srv.url("/upload")).body("small").send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "5");

    let res = client
        .post(srv.url("/upload"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);

    srv.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn axum_router_serves_as_terminal_handler() {
    let api = axum::Router::new().route(
        "/api/greet/{name}",
        axum::routing::get(|axum::extract::Path(name): axum::extract::Path<String>| async move {
            format!("greetings, {name}")
        }),
    );

    let mut server = Server::new(local_config());
    server
        .get(
            "/api/greet/{name}",
            vec![
                raw(|ex| {
                    ex.response_mut()
                        .headers_mut()
                        .insert("x-bridged", "yes".parse().unwrap());
                }),
                service(api),
            ],
        )
        .unwrap();

    let srv = common::spawn(server).await;
    let res = common::client().get(srv.url("/api/greet/ada")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-bridged"], "yes");
    assert_eq!(res.text().await.unwrap(), "greetings, ada");

    srv.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn request_id_and_server_headers() {
    let mut server = Server::new(local_config());
    server
        .use_middleware(vec![request_id()])
        .unwrap()
        .get(
            "/whoami",
            vec![handler(|ctx| {
                let id = ctx
                    .get::<strata::http::RequestId>()
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                ctx.text(id)
            })],
        )
        .unwrap();

    let srv = common::spawn(server).await;
    let client = common::client();

    let res = client
        .get(srv.url("/whoami"))
        .header(X_REQUEST_ID, "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()[header::SERVER], "strata-test");
    assert_eq!(res.headers()[X_REQUEST_ID], "trace-me");
    assert_eq!(res.text().await.unwrap(), "trace-me");

    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    let generated = res.headers()[X_REQUEST_ID].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&generated).is_ok());
    assert_eq!(res.text().await.unwrap(), generated);

    srv.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn link_header_for_paginated_listing() {
    let mut server = Server::new(local_config());
    server
        .get(
            "/items",
            vec![handler(|ctx| {
                let page = ctx.query("page").and_then(|p| p.parse().ok()).unwrap_or(1);
                ctx.set_link_header(&Link::new(1, page, 3))?;
                ctx.text(format!("page {page}"))
            })],
        )
        .unwrap();

    let srv = common::spawn(server).await;
    let res = common::client()
        .get(srv.url("/items?page=2&sort=asc"))
        .send()
        .await
        .unwrap();

    let link = res.headers()[header::LINK].to_str().unwrap().to_string();
    let base = srv.url("/items");
    assert!(link.contains(&format!("<{base}?page=1&sort=asc>; rel=\"first\"")));
    assert!(link.contains(&format!("<{base}?page=3&sort=asc>; rel=\"next\"")));
    assert!(link.contains(&format!("<{base}?page=1&sort=asc>; rel=\"prev\"")));
    assert!(link.contains(&format!("<{base}?page=3&sort=asc>; rel=\"last\"")));

    srv.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn mounted_group_wraps_its_routes() {
    let mut group = Group::new();
    group
        .use_middleware(vec![continuation(|ctx, next| {
            if ctx.request()?.headers().contains_key(header::AUTHORIZATION) {
                next.call(ctx)
            } else {
                Err(HttpError::with_status(StatusCode::UNAUTHORIZED))
            }
        })])
        .unwrap()
        .get("/admin/stats", vec![handler(|ctx| ctx.json(&serde_json::json!({ "up": true })))])
        .unwrap();

    let mut server = Server::new(local_config());
    server
        .mount(group)
        .unwrap()
        .get("/public", vec![handler(|ctx| ctx.text("open"))])
        .unwrap();

    let srv = common::spawn(server).await;
    let client = common::client();

    let res = client.get(srv.url("/admin/stats")).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(srv.url("/admin/stats"))
        .header(header::AUTHORIZATION, "Bearer x")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(srv.url("/public")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "open");

    srv.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn routes_loaded_from_configuration() {
    let config = parse_config(
        r#"
        middleware = ["stamp"]

        [server]
        name = "from-file"

        [[routes]]
        method = "GET"
        path = "/hello/{who}"
        handlers = ["hello"]

        [[routes]]
        method = "GET"
        path = "/later"
        handlers = []
        "#,
    )
    .unwrap();

    let mut registry = HandlerRegistry::new();
    registry
        .register(
            "stamp",
            raw(|ex| {
                ex.response_mut()
                    .headers_mut()
                    .insert("x-stamp", "1".parse().unwrap());
            }),
        )
        .register(
            "hello",
            handler(|ctx| {
                let who = ctx.param("who").unwrap_or("nobody").to_string();
                ctx.text(format!("hello {who}"))
            }),
        );

    let mut server = Server::new(config);
    server.load_routes(&registry).unwrap();

    let srv = common::spawn(server).await;
    let res = common::client().get(srv.url("/hello/bob")).send().await.unwrap();
    assert_eq!(res.headers()[header::SERVER], "from-file");
    assert_eq!(res.headers()["x-stamp"], "1");
    assert_eq!(res.text().await.unwrap(), "hello bob");

    let res = common::client().get(srv.url("/later")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    srv.stop().await.unwrap();
}

#[test]
fn unknown_handler_name_fails_loading() {
    let config = parse_config(
        r#"
        [[routes]]
        method = "GET"
        path = "/"
        handlers = ["missing"]
        "#,
    )
    .unwrap();

    let mut server = Server::new(config);
    let err = server.load_routes(&HandlerRegistry::new()).unwrap_err();
    assert!(matches!(err, strata::PipelineError::UnknownHandler(name) if name == "missing"));
}

#[tokio::test(flavor = "multi_thread")]
async fn serving_twice_is_rejected() {
    let mut server = Server::new(local_config());
    server.start().unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let err = server.serve(listener, async {}).await.unwrap_err();
    assert!(matches!(err, strata::PipelineError::AlreadyRunning));
}
