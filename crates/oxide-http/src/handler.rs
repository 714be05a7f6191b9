//! Request handlers.

use std::future::Future;
use std::sync::Arc;

use crate::error::BoxError;
use crate::middleware::{BoxFuture, MiddlewareResult};
use crate::request::Request;
use crate::response::Response;

type HandlerFn = dyn Fn(Request) -> BoxFuture<'static, MiddlewareResult> + Send + Sync;

/// A shareable async request handler.
///
/// A handler may answer the request, pass it on to the next layer, or fail
/// it. The constructors cover the three common shapes.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    /// Wraps a handler that always answers.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |req: Request| -> BoxFuture<'static, MiddlewareResult> {
                let fut = handler(req);
                Box::pin(async move { MiddlewareResult::Response(fut.await) })
            }),
        }
    }

    /// Wraps a handler that decides the flow itself, e.g. to fall through.
    pub fn flow<F, Fut>(handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MiddlewareResult> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |req: Request| -> BoxFuture<'static, MiddlewareResult> {
                Box::pin(handler(req))
            }),
        }
    }

    /// Wraps a handler whose errors are routed to error middleware.
    pub fn fallible<F, Fut, E>(handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |req: Request| -> BoxFuture<'static, MiddlewareResult> {
                let retained = req.clone();
                let fut = handler(req);
                Box::pin(async move {
                    match fut.await {
                        Ok(res) => MiddlewareResult::Response(res),
                        Err(e) => MiddlewareResult::Error(retained, e.into()),
                    }
                })
            }),
        }
    }

    /// Invokes the handler.
    pub fn call(&self, req: Request) -> BoxFuture<'static, MiddlewareResult> {
        (self.inner)(req)
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Handler")
    }
}
