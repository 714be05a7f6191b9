//! Middleware support for request/response processing.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;

/// A boxed future for async middleware operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of one pipeline step.
pub enum MiddlewareResult {
    /// Continue to the next middleware/handler.
    Continue(Request),
    /// Stop processing and return this response.
    Response(Response),
    /// Processing failed; only error middleware runs from here on.
    Error(Request, BoxError),
}

impl MiddlewareResult {
    /// Returns the response if this step answered the request.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Response(res) => Some(res),
            _ => None,
        }
    }
}

impl std::fmt::Debug for MiddlewareResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue(req) => f.debug_tuple("Continue").field(&req.path).finish(),
            Self::Response(res) => f.debug_tuple("Response").field(&res.status).finish(),
            Self::Error(req, err) => f
                .debug_tuple("Error")
                .field(&req.path)
                .field(&err.to_string())
                .finish(),
        }
    }
}

/// Trait for middleware that processes requests and responses.
///
/// Middleware can:
/// - Modify the request before later layers see it
/// - Short-circuit processing and return a response
/// - Fail the request, handing it to error middleware
/// - Modify the response on the way out
pub trait Middleware: Send + Sync {
    /// Called in pipeline order while the request is still unanswered.
    fn before<'a>(&'a self, req: Request) -> BoxFuture<'a, MiddlewareResult>;

    /// Called in reverse order for every middleware whose `before` ran.
    fn after<'a>(&'a self, res: Response) -> BoxFuture<'a, Response> {
        Box::pin(async move { res })
    }
}

/// Middleware that only runs once a previous layer failed the request.
pub trait ErrorMiddleware: Send + Sync {
    /// Handles the error; return `Error` again to pass it along.
    fn on_error<'a>(&'a self, err: BoxError, req: Request) -> BoxFuture<'a, MiddlewareResult>;
}

/// Sets a fixed header on every response.
pub struct SetHeader {
    name: String,
    value: String,
}

impl SetHeader {
    /// Creates a middleware that stamps `name: value` on responses.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Middleware for SetHeader {
    fn before<'a>(&'a self, req: Request) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move { MiddlewareResult::Continue(req) })
    }

    fn after<'a>(&'a self, res: Response) -> BoxFuture<'a, Response> {
        Box::pin(async move { res.header(self.name.clone(), self.value.clone()) })
    }
}

/// Traces requests and response statuses at debug level.
pub struct RequestTrace;

impl Middleware for RequestTrace {
    fn before<'a>(&'a self, req: Request) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            debug!(method = %req.method, path = %req.path, "--> request");
            MiddlewareResult::Continue(req)
        })
    }

    fn after<'a>(&'a self, res: Response) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            debug!(status = res.status, "<-- response");
            res
        })
    }
}

fn content_type_is(req: &Request, expected: &str) -> bool {
    req.get_header("Content-Type").is_some_and(|ct| {
        ct.split(';')
            .next()
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(expected))
    })
}

fn malformed(kind: &str, message: impl Into<String>) -> MiddlewareResult {
    MiddlewareResult::Response(
        Response::json(&serde_json::json!({
            "message": format!("Malformed {kind} body."),
            "error": message.into(),
        }))
        .status(400),
    )
}

/// Parses `application/json` bodies into `Request::parsed_body`.
pub struct JsonBodyParser;

impl Middleware for JsonBodyParser {
    fn before<'a>(&'a self, mut req: Request) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            if req.body.is_empty() || !content_type_is(&req, "application/json") {
                return MiddlewareResult::Continue(req);
            }
            match serde_json::from_slice::<Value>(&req.body) {
                Ok(value) => {
                    req.parsed_body = Some(value);
                    MiddlewareResult::Continue(req)
                }
                Err(e) => malformed("JSON", e.to_string()),
            }
        })
    }
}

/// Parses `application/x-www-form-urlencoded` bodies into a JSON object of strings.
pub struct UrlEncodedParser;

impl Middleware for UrlEncodedParser {
    fn before<'a>(&'a self, mut req: Request) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            if req.body.is_empty() || !content_type_is(&req, "application/x-www-form-urlencoded") {
                return MiddlewareResult::Continue(req);
            }
            let Ok(text) = std::str::from_utf8(&req.body) else {
                return malformed("urlencoded", "body is not valid UTF-8");
            };
            let fields: Map<String, Value> = Request::parse_query_string(text)
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            req.parsed_body = Some(Value::Object(fields));
            MiddlewareResult::Continue(req)
        })
    }
}

/// Middleware that adds CORS headers and answers preflight requests.
///
/// Every origin is allowed.
#[cfg(feature = "cors")]
pub struct CorsMiddleware {
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Allowed headers.
    pub allowed_headers: Vec<String>,
}

#[cfg(feature = "cors")]
impl CorsMiddleware {
    /// Creates CORS middleware that allows all origins.
    pub fn permissive() -> Self {
        Self {
            allowed_methods: ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"]
                .iter()
                .map(|m| (*m).to_string())
                .collect(),
            allowed_headers: vec!["*".to_string()],
        }
    }
}

#[cfg(feature = "cors")]
impl Middleware for CorsMiddleware {
    fn before<'a>(&'a self, req: Request) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            if req.method == crate::request::Method::Options {
                let res = Response::new(204)
                    .header(
                        "Access-Control-Allow-Methods",
                        self.allowed_methods.join(","),
                    )
                    .header(
                        "Access-Control-Allow-Headers",
                        self.allowed_headers.join(","),
                    )
                    .header("Access-Control-Max-Age", "86400");
                return MiddlewareResult::Response(res);
            }
            MiddlewareResult::Continue(req)
        })
    }

    fn after<'a>(&'a self, res: Response) -> BoxFuture<'a, Response> {
        Box::pin(async move { res.header("Access-Control-Allow-Origin", "*") })
    }
}
