//! The ordered application pipeline.

use std::sync::Arc;

use tracing::warn;

use crate::middleware::{BoxFuture, ErrorMiddleware, Middleware, MiddlewareResult};
use crate::request::{PathParams, Request};
use crate::response::Response;
use crate::router::Router;

enum Layer {
    Use(Arc<dyn Middleware>),
    Mount { prefix: String, router: Arc<Router> },
    Error(Arc<dyn ErrorMiddleware>),
}

/// An ordered stack of middleware, mounted routers, and error handlers.
///
/// Requests walk the layers in insertion order until one answers. Once a
/// layer fails the request only error layers run. A request nobody answers
/// gets `404`; an error nobody handles gets `500`.
#[derive(Default)]
pub struct App {
    layers: Vec<Layer>,
}

impl App {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends middleware.
    #[must_use]
    pub fn middleware(self, mw: impl Middleware + 'static) -> Self {
        self.middleware_arc(Arc::new(mw))
    }

    /// Appends shared middleware.
    #[must_use]
    pub fn middleware_arc(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.layers.push(Layer::Use(mw));
        self
    }

    /// Mounts a router under `prefix`.
    #[must_use]
    pub fn mount(mut self, prefix: &str, router: impl Into<Arc<Router>>) -> Self {
        self.layers.push(Layer::Mount {
            prefix: normalize_prefix(prefix),
            router: router.into(),
        });
        self
    }

    /// Appends an error handler.
    #[must_use]
    pub fn error_middleware(mut self, handler: Arc<dyn ErrorMiddleware>) -> Self {
        self.layers.push(Layer::Error(handler));
        self
    }

    /// Number of installed layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true when nothing is installed.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Handles an incoming request.
    pub fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            let mut ran: Vec<&dyn Middleware> = Vec::new();
            let mut state = MiddlewareResult::Continue(request);

            for layer in &self.layers {
                state = match (layer, state) {
                    (Layer::Use(mw), MiddlewareResult::Continue(req)) => {
                        ran.push(mw.as_ref());
                        mw.before(req).await
                    }
                    (Layer::Mount { prefix, router }, MiddlewareResult::Continue(req)) => {
                        dispatch_mounted(prefix, router, req).await
                    }
                    (Layer::Error(handler), MiddlewareResult::Error(req, err)) => {
                        handler.on_error(err, req).await
                    }
                    (_, skipped) => skipped,
                };
                if matches!(state, MiddlewareResult::Response(_)) {
                    break;
                }
            }

            let mut response = match state {
                MiddlewareResult::Response(res) => res,
                MiddlewareResult::Continue(_) => Response::not_found(),
                MiddlewareResult::Error(req, err) => {
                    warn!(method = %req.method, path = %req.original_path(), error = %err, "unhandled server error");
                    Response::internal_server_error()
                }
            };

            for mw in ran.iter().rev() {
                response = mw.after(response).await;
            }

            response
        })
    }

    /// Sends a response produced outside the pipeline through every
    /// middleware's `after`, in reverse order.
    pub fn finish(&self, mut response: Response) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            for layer in self.layers.iter().rev() {
                if let Layer::Use(mw) = layer {
                    response = mw.after(response).await;
                }
            }
            response
        })
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mounts: Vec<&str> = self
            .layers
            .iter()
            .filter_map(|layer| match layer {
                Layer::Mount { prefix, .. } => Some(prefix.as_str()),
                _ => None,
            })
            .collect();
        f.debug_struct("App")
            .field("layers", &self.layers.len())
            .field("mounts", &mounts)
            .finish()
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Strips `prefix` off the request path, or `None` if it does not apply.
fn strip_mount_prefix<'p>(prefix: &str, path: &'p str) -> Option<&'p str> {
    if prefix == "/" {
        return Some(path);
    }
    match path.strip_prefix(prefix) {
        Some("") => Some("/"),
        Some(rest) if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

async fn dispatch_mounted(prefix: &str, router: &Router, mut req: Request) -> MiddlewareResult {
    let Some(sub_path) = strip_mount_prefix(prefix, &req.path).map(str::to_string) else {
        return MiddlewareResult::Continue(req);
    };
    if prefix == "/" {
        return router.dispatch(req).await;
    }

    let original_path = std::mem::replace(&mut req.path, sub_path);
    let original_base = req.base_url.clone();
    req.base_url.push_str(prefix);

    let restore = |mut req: Request| {
        req.path = original_path.clone();
        req.base_url = original_base.clone();
        req.params = PathParams::new();
        req
    };

    match router.dispatch(req).await {
        MiddlewareResult::Continue(req) => MiddlewareResult::Continue(restore(req)),
        MiddlewareResult::Error(req, err) => MiddlewareResult::Error(restore(req), err),
        done => done,
    }
}
