//! Plugin hooks, extensions, and router lifecycle.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use common::{body, routing_root, send};
use oxide_fsroute::{
    DefaultExport, EngineState, FileRouter, FsRouteError, ModuleRegistry, Plugin, RouteModule,
    RouterOptions,
};
use oxide_http::{
    BoxFuture, Handler, Method, Middleware, MiddlewareResult, Request, RequestTrace, Response,
};

fn registry() -> ModuleRegistry {
    ModuleRegistry::new()
        .module(
            "index.ts",
            RouteModule::new().handler(|_| async { Response::text("root") }),
        )
        .module(
            "fail.ts",
            RouteModule::new().default_export(DefaultExport::Handler(Handler::fallible(
                |_req| async { Err::<Response, _>("boom") },
            ))),
        )
}

fn recorder(name: &'static str, seen: &Arc<Mutex<Vec<&'static str>>>) -> Plugin {
    let seen = seen.clone();
    Plugin::new(name, move |req, _ctx| {
        seen.lock().unwrap().push(name);
        async move { MiddlewareResult::Continue(req) }
    })
}

#[tokio::test]
async fn test_plugins_run_in_registration_order_after_routes() {
    let root = routing_root(&["index.ts"]);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut router = FileRouter::new(root.path(), registry());
    router
        .use_plugin(recorder("first", &seen))
        .unwrap()
        .use_plugin(recorder("second", &seen))
        .unwrap();
    let app = router.build().await.unwrap();

    assert_eq!(body(&send(&app, Method::Get, "/").await), "root");
    assert!(seen.lock().unwrap().is_empty());

    assert_eq!(send(&app, Method::Get, "/missing").await.status, 404);
    assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
}

#[tokio::test]
async fn test_plugin_can_answer_unmatched_requests() {
    let root = routing_root(&["index.ts"]);
    let mut router = FileRouter::new(root.path(), registry());
    router
        .use_plugin(Plugin::new("teapot", |_req, _ctx| async {
            MiddlewareResult::Response(Response::text("short and stout").status(418))
        }))
        .unwrap();
    let app = router.build().await.unwrap();

    assert_eq!(send(&app, Method::Get, "/").await.status, 200);
    assert_eq!(send(&app, Method::Get, "/elsewhere").await.status, 418);
}

#[tokio::test]
async fn test_on_register_called_once_after_install() {
    let root = routing_root(&["index.ts"]);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut router = FileRouter::new(root.path(), registry());
    router
        .use_plugin(
            Plugin::new("counted", |req, _ctx| async move { MiddlewareResult::Continue(req) })
                .version("1.2.0")
                .description("counts registrations")
                .on_register(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let app = router.build().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    send(&app, Method::Get, "/").await;
    send(&app, Method::Get, "/missing").await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_on_register_not_repeated_after_failed_bind() {
    let root = routing_root(&["index.ts"]);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut router = FileRouter::new(root.path(), registry());
    router
        .use_plugin(
            Plugin::new("counted", |req, _ctx| async move { MiddlewareResult::Continue(req) })
                .on_register(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();

    let taken = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
    let port = taken.local_addr().unwrap().port();
    assert!(matches!(router.start(port).await, Err(FsRouteError::Server(_))));
    assert_eq!(router.state(), EngineState::Configuring);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let server = router.start(0).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    server.shutdown().await.unwrap();
    drop(taken);
}

#[tokio::test]
async fn test_duplicate_plugin_name_rejected() {
    let root = routing_root(&[]);
    let mut router = FileRouter::new(root.path(), ModuleRegistry::new());
    let plugin = Plugin::new("dup", |req, _ctx| async move { MiddlewareResult::Continue(req) });

    router.use_plugin(plugin.clone()).unwrap();
    assert!(matches!(
        router.use_plugin(plugin),
        Err(FsRouteError::CantRegister(_))
    ));
    assert_eq!(router.plugins().len(), 1);
}

#[tokio::test]
async fn test_handler_failure_without_error_hook_is_500() {
    let root = routing_root(&["fail.ts"]);
    let mut router = FileRouter::new(root.path(), registry());
    let app = router.build().await.unwrap();

    assert_eq!(send(&app, Method::Get, "/fail").await.status, 500);
}

#[tokio::test]
async fn test_server_error_hook_answers_failures() {
    let root = routing_root(&["fail.ts"]);
    let mut router = FileRouter::new(root.path(), registry());
    router
        .use_plugin(
            Plugin::new("errors", |req, _ctx| async move { MiddlewareResult::Continue(req) })
                .on_server_error(|err, req| async move {
                    MiddlewareResult::Response(
                        Response::text(format!("{} failed: {err}", req.path)).status(503),
                    )
                }),
        )
        .unwrap();
    let app = router.build().await.unwrap();

    let res = send(&app, Method::Get, "/fail").await;
    assert_eq!(res.status, 503);
    assert_eq!(body(&res), "/fail failed: boom");
}

/// Answers `/blocked` before any route sees it.
struct Blocker;

impl Middleware for Blocker {
    fn before<'a>(&'a self, req: Request) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            if req.path == "/blocked" {
                MiddlewareResult::Response(Response::text("blocked").status(403))
            } else {
                MiddlewareResult::Continue(req)
            }
        })
    }
}

#[tokio::test]
async fn test_extensions_run_before_routes() {
    let root = routing_root(&["blocked.ts", "index.ts"]);
    let registry = registry().module(
        "blocked.ts",
        RouteModule::new().handler(|_| async { Response::text("reached") }),
    );
    let mut router = FileRouter::new(root.path(), registry);
    router.extend(Blocker).unwrap();
    let app = router.build().await.unwrap();

    assert_eq!(send(&app, Method::Get, "/blocked").await.status, 403);
    assert_eq!(send(&app, Method::Get, "/").await.status, 200);
}

#[cfg(feature = "cors")]
#[tokio::test]
async fn test_cors_preflight_when_enabled() {
    let root = routing_root(&["index.ts"]);
    let mut router = FileRouter::new(root.path(), registry());
    router.configure(RouterOptions::new().cors(true)).unwrap();
    let app = router.build().await.unwrap();

    let res = send(&app, Method::Options, "/").await;
    assert_eq!(res.status, 204);
    assert!(res.get_header("Access-Control-Allow-Origin").is_some());
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let root = routing_root(&["index.ts"]);
    let mut router = FileRouter::new(root.path(), registry());
    assert_eq!(router.state(), EngineState::Configuring);

    let server = router.start(0).await.unwrap();
    assert_eq!(router.state(), EngineState::Running);

    assert!(matches!(router.start(0).await, Err(FsRouteError::CantRegister(_))));
    assert!(matches!(
        router.use_plugin(Plugin::new("late", |req, _ctx| async move {
            MiddlewareResult::Continue(req)
        })),
        Err(FsRouteError::CantRegister(_))
    ));
    assert!(matches!(router.extend(RequestTrace), Err(FsRouteError::CantRegister(_))));

    server.shutdown().await.unwrap();
}
