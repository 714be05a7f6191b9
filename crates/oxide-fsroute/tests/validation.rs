//! Request body validation through exported schemas.

mod common;

use std::sync::Arc;

use common::routing_root;
use oxide_fsroute::{FileRouter, ModuleRegistry, Plugin, RouteModule, RouterOptions, TypedSchema};
use oxide_http::{App, Method, MiddlewareResult, Request, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Deserialize, Serialize)]
struct NewUser {
    name: String,
    #[serde(default)]
    admin: bool,
}

fn echo_body() -> RouteModule {
    RouteModule::new()
        .handler(|req: Request| async move {
            Response::json(&req.parsed_body.unwrap_or(Value::Null))
        })
        .methods([Method::Get, Method::Post])
        .validator(TypedSchema::<NewUser>::new())
}

async fn app_with(options: RouterOptions, plugin: Option<Plugin>) -> Arc<App> {
    let root = routing_root(&["users/create.ts"]);
    let registry = ModuleRegistry::new().module("users/create.ts", echo_body());
    let mut router = FileRouter::new(root.path(), registry);
    router.configure(options).unwrap();
    if let Some(plugin) = plugin {
        router.use_plugin(plugin).unwrap();
    }
    router.build().await.unwrap()
}

fn validating() -> RouterOptions {
    RouterOptions::new()
        .json_body_parsing(true)
        .validation_enabled(true)
}

fn post(body: &Value) -> Request {
    Request::post("/users/create").json_body(body)
}

#[tokio::test]
async fn test_valid_body_reaches_handler_coerced() {
    let app = app_with(validating(), None).await;
    let res = app.handle(post(&json!({"name": "ada", "extra": 1}))).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body_json(), Some(json!({"name": "ada", "admin": false})));
}

#[tokio::test]
async fn test_invalid_body_gets_400_with_schema_error() {
    let app = app_with(validating(), None).await;
    let res = app.handle(post(&json!({"admin": true}))).await;

    assert_eq!(res.status, 400);
    let body = res.body_json().unwrap();
    assert_eq!(body["message"], "Validation error.");
    assert_eq!(body["error"]["name"], "ValidationError");
    assert!(body["error"]["issues"][0]["message"]
        .as_str()
        .unwrap()
        .contains("name"));
}

#[tokio::test]
async fn test_get_bypasses_validation() {
    let app = app_with(validating(), None).await;
    let res = app.handle(Request::get("/users/create")).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body_json(), Some(Value::Null));
}

#[tokio::test]
async fn test_validation_disabled_passes_body_through() {
    let app = app_with(RouterOptions::new().json_body_parsing(true), None).await;
    let res = app.handle(post(&json!({"admin": "yes"}))).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body_json(), Some(json!({"admin": "yes"})));
}

#[tokio::test]
async fn test_missing_body_fails_validation() {
    let app = app_with(validating(), None).await;
    let res = app.handle(Request::post("/users/create")).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_malformed_json_rejected_by_parser() {
    let app = app_with(validating(), None).await;
    let req = Request::post("/users/create")
        .header("Content-Type", "application/json")
        .body("{not json");
    let res = app.handle(req).await;

    assert_eq!(res.status, 400);
    assert_ne!(res.body_json().unwrap()["message"], "Validation error.");
}

#[tokio::test]
async fn test_validator_error_plugin_receives_error() {
    let plugin = Plugin::new("onValidatorError", |_req, ctx| async move {
        match ctx.validation_error {
            Some(error) => MiddlewareResult::Response(
                Response::json(&json!({"rejected": error["name"]})).status(422),
            ),
            None => MiddlewareResult::Response(Response::text("fallback").status(418)),
        }
    });
    let app = app_with(validating(), Some(plugin)).await;

    let res = app.handle(post(&json!({}))).await;
    assert_eq!(res.status, 422);
    assert_eq!(res.body_json(), Some(json!({"rejected": "ValidationError"})));

    // Installed like any other plugin for unmatched requests.
    let res = app.handle(Request::get("/nowhere")).await;
    assert_eq!(res.status, 418);
}

#[tokio::test]
async fn test_url_encoded_body_is_validated() {
    let app = app_with(
        RouterOptions::new()
            .url_encoded_body_parsing(true)
            .validation_enabled(true),
        None,
    )
    .await;
    let req = Request::post("/users/create")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("name=grace+hopper");
    let res = app.handle(req).await;

    assert_eq!(res.status, 200);
    assert_eq!(
        res.body_json(),
        Some(json!({"name": "grace hopper", "admin": false}))
    );
}
