//! Composable sub-router.

use std::future::Future;

use crate::handler::Handler;
use crate::middleware::{BoxFuture, MiddlewareResult};
use crate::path::PathPattern;
use crate::request::{Method, Request};
use crate::response::Response;

/// A single route inside a [`Router`].
#[derive(Clone, Debug)]
pub struct Route {
    /// HTTP method, or `None` to accept every method.
    pub method: Option<Method>,
    /// Path pattern, relative to the router's mount point.
    pub pattern: PathPattern,
    /// Request handler.
    pub handler: Handler,
}

/// A self-contained router that manages its own sub-paths and methods.
///
/// Mounted into an [`App`](crate::App) at a prefix; requests it does not
/// match fall through to the next layer.
///
/// ```ignore
/// let users = Router::new()
///     .get("/", list_users)
///     .get("/{id}", show_user)
///     .post("/", create_user);
///
/// let app = App::new().mount("/users", users);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates a new empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a GET route.
    #[must_use]
    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Some(Method::Get), path, Handler::new(handler))
    }

    /// Adds a POST route.
    #[must_use]
    pub fn post<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Some(Method::Post), path, Handler::new(handler))
    }

    /// Adds a PUT route.
    #[must_use]
    pub fn put<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Some(Method::Put), path, Handler::new(handler))
    }

    /// Adds a PATCH route.
    #[must_use]
    pub fn patch<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Some(Method::Patch), path, Handler::new(handler))
    }

    /// Adds a DELETE route.
    #[must_use]
    pub fn delete<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Some(Method::Delete), path, Handler::new(handler))
    }

    /// Adds a route with any method filter and a prebuilt handler.
    #[must_use]
    pub fn route(mut self, method: Option<Method>, path: &str, handler: Handler) -> Self {
        self.routes.push(Route {
            method,
            pattern: PathPattern::new(path),
            handler,
        });
        self
    }

    /// Returns the registered routes.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Runs the request through matching routes in order.
    ///
    /// A handler that continues hands the request to the next matching
    /// route; if none answers, the request comes back as `Continue`.
    pub fn dispatch(&self, request: Request) -> BoxFuture<'_, MiddlewareResult> {
        Box::pin(async move {
            let mut request = request;
            for route in &self.routes {
                if route.method.is_some_and(|m| m != request.method) {
                    continue;
                }
                let Some(params) = route.pattern.match_path(&request.path) else {
                    continue;
                };
                request.params = params;
                match route.handler.call(request).await {
                    MiddlewareResult::Continue(req) => request = req,
                    done => return done,
                }
            }
            MiddlewareResult::Continue(request)
        })
    }
}
