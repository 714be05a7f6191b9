//! # oxide-http
//!
//! A small HTTP application layer in the spirit of express-style stacks.
//!
//! This crate provides:
//! - Request/response types with a structured body slot
//! - An ordered middleware pipeline where every layer may answer, pass the
//!   request on, or fail it
//! - Composable sub-routers with `{param}` path patterns, mountable at a prefix
//! - Built-in JSON / urlencoded body parsers and CORS
//! - A hyper-backed HTTP/1 listener
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use oxide_http::{serve, App, JsonBodyParser, Request, Response, Router};
//!
//! let users = Router::new()
//!     .get("/{id}", |req: Request| async move {
//!         Response::text(format!("user {}", req.params.get("id").unwrap_or("?")))
//!     });
//!
//! let app = App::new()
//!     .middleware(JsonBodyParser)
//!     .mount("/users", users);
//!
//! let handle = serve(Arc::new(app), ([127, 0, 0, 1], 3000).into()).await?;
//! ```
//!
//! ## Pipeline semantics
//!
//! Layers run in insertion order. A layer returning
//! [`MiddlewareResult::Continue`] hands the (possibly modified) request to
//! the next layer; [`MiddlewareResult::Response`] ends the walk;
//! [`MiddlewareResult::Error`] skips every regular layer until an
//! [`ErrorMiddleware`] answers. Unanswered requests get `404`, unhandled
//! errors `500`.

mod app;
mod error;
mod handler;
mod middleware;
mod path;
mod request;
mod response;
mod router;
mod server;

pub use app::App;
pub use error::{BoxError, HttpError, Result};
pub use handler::Handler;
#[cfg(feature = "cors")]
pub use middleware::CorsMiddleware;
pub use middleware::{
    BoxFuture, ErrorMiddleware, JsonBodyParser, Middleware, MiddlewareResult, RequestTrace,
    SetHeader, UrlEncodedParser,
};
pub use path::PathPattern;
pub use request::{Method, PathParams, Request};
pub use response::Response;
pub use router::{Route, Router};
pub use server::{serve, ServerHandle};
