//! Serves a small file-routed application on port 3000.
//!
//! ```sh
//! cargo run -p oxide-fsroute --example hello_routes
//! curl localhost:3000/
//! curl -X POST localhost:3000/users/create -H 'content-type: application/json' -d '{"name":"ada"}'
//! curl localhost:3000/api/status
//! ```

use std::fs;

use oxide_fsroute::{FileRouter, ModuleRegistry, Plugin, RouteModule, RouterOptions, TypedSchema};
use oxide_http::{Method, MiddlewareResult, Request, Response, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Deserialize, Serialize)]
struct NewUser {
    name: String,
    #[serde(default)]
    admin: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Route files only need to exist; the registry supplies their exports.
    let root = tempfile::tempdir()?;
    for file in ["index.rs", "users/create.rs", "api.rs"] {
        let path = root.path().join("router").join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, "")?;
    }

    let api = Router::new().get("/status", |_| async {
        Response::json(&serde_json::json!({ "ok": true }))
    });

    let registry = ModuleRegistry::new()
        .module(
            "index.rs",
            RouteModule::new().handler(|_| async { Response::text("Hello from oxide-fsroute") }),
        )
        .module(
            "users/create.rs",
            RouteModule::new()
                .handler(|req: Request| async move {
                    match req.json::<NewUser>() {
                        Ok(user) => Response::json(&user).status(201),
                        Err(e) => Response::text(e.to_string()).status(400),
                    }
                })
                .methods([Method::Post])
                .validator(TypedSchema::<NewUser>::new()),
        )
        .module("api.rs", RouteModule::new().router(api));

    let mut router = FileRouter::new(root.path(), registry);
    router
        .configure(
            RouterOptions::new()
                .development_logging(true)
                .json_body_parsing(true)
                .validation_enabled(true),
        )?
        .use_plugin(
            Plugin::new("not-found", |req, _ctx| async move {
                MiddlewareResult::Response(
                    Response::json(&serde_json::json!({ "missing": req.path })).status(404),
                )
            })
            .version("0.1.0")
            .on_register(|| info!("not-found plugin ready")),
        )?;

    let server = router.start(3000).await?;
    info!("open http://{}", server.local_addr());

    tokio::signal::ctrl_c().await?;
    server.shutdown().await?;
    Ok(())
}
