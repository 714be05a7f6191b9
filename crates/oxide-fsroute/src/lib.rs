//! # oxide-fsroute
//!
//! Convention-based file routing on top of `oxide-http`.
//!
//! Files under `<routing_root>/router` become URL routes:
//!
//! | File                        | Route            |
//! |-----------------------------|------------------|
//! | `router/index.rs`           | `/`              |
//! | `router/users/index.rs`     | `/users`         |
//! | `router/users/create.rs`    | `/users/create`  |
//!
//! A [`ModuleLoader`] turns each discovered file into a [`RouteModule`]: a
//! default handler or composed router, an optional method `config`, and an
//! optional body validator. [`ModuleRegistry`] is a loader keyed by the
//! file's router-relative path.
//!
//! ## Quick Start
//!
//! ```ignore
//! use oxide_fsroute::{FileRouter, ModuleRegistry, RouteModule, RouterOptions, TypedSchema};
//! use oxide_http::{Method, Request, Response};
//!
//! let registry = ModuleRegistry::new()
//!     .module("index.rs", RouteModule::new().handler(|_| async { Response::text("root") }))
//!     .module(
//!         "users/create.rs",
//!         RouteModule::new()
//!             .handler(|req: Request| async move { Response::json(&req.parsed_body) })
//!             .methods([Method::Post])
//!             .validator(TypedSchema::<NewUser>::new()),
//!     );
//!
//! let mut router = FileRouter::new("./app", registry);
//! router.configure(
//!     RouterOptions::new()
//!         .json_body_parsing(true)
//!         .validation_enabled(true),
//! )?;
//! let server = router.start(3000).await?;
//! ```
//!
//! ## Route shapes
//!
//! In priority order: a composed router is mounted as is; per-method
//! handlers register one route each; a `method` list restricts the default
//! handler; a bare default handler answers all nine methods. Anything else
//! is skipped with a warning.

mod config;
mod engine;
mod error;
mod mapper;
mod module;
mod plugin;
mod scanner;
mod table;
mod validator;

pub use config::{RouterConfig, RouterOptions};
pub use engine::{EngineState, FileRouter, POWERED_BY, POWERED_BY_HEADER};
pub use error::{FsRouteError, Result};
pub use mapper::{map_path, ROUTER_DIR, SOURCE_EXTENSIONS};
pub use module::{
    classify, DefaultExport, LoadError, ModuleLoader, ModuleRegistry, RouteConfig, RouteModule,
    RouteShape, UnresolvedRoute,
};
pub use plugin::{HookContext, Plugin, VALIDATOR_ERROR_PLUGIN};
pub use scanner::{scan, RouteFile};
pub use table::{MethodSet, RegisteredRoute, RouteTable, RouteTarget};
pub use validator::{validate, Schema, TypedSchema, ValidationResult};
