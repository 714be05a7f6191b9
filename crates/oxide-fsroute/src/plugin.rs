//! Named bundles of request-lifecycle hooks.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use oxide_http::{BoxError, BoxFuture, ErrorMiddleware, Middleware, MiddlewareResult, Request};
use serde_json::Value;

/// Plugin name consulted when a request body fails validation.
pub const VALIDATOR_ERROR_PLUGIN: &str = "onValidatorError";

/// Extra information handed to an `on_use` hook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookContext {
    /// The schema error, when the hook runs for a failed validation.
    pub validation_error: Option<Value>,
}

type UseHook = dyn Fn(Request, HookContext) -> BoxFuture<'static, MiddlewareResult> + Send + Sync;
type ErrorHook = dyn Fn(BoxError, Request) -> BoxFuture<'static, MiddlewareResult> + Send + Sync;
type RegisterHook = dyn Fn() + Send + Sync;

/// A plugin registered on a [`FileRouter`](crate::FileRouter).
///
/// `on_use` runs at the tail of the pipeline for requests no route
/// answered; it is always awaited. `on_server_error` sees failed requests.
/// `on_register` runs once after everything is installed.
///
/// ```
/// use oxide_fsroute::Plugin;
/// use oxide_http::{MiddlewareResult, Response};
///
/// let plugin = Plugin::new("fallback", |_req, _ctx| async {
///     MiddlewareResult::Response(Response::text("fallback").status(404))
/// })
/// .version("1.0.0");
/// assert_eq!(plugin.name(), "fallback");
/// ```
#[derive(Clone)]
pub struct Plugin {
    name: String,
    version: String,
    description: Option<String>,
    use_hook: Arc<UseHook>,
    error_hook: Option<Arc<ErrorHook>>,
    register_hook: Option<Arc<RegisterHook>>,
}

impl Plugin {
    /// Creates a plugin with its `on_use` hook.
    pub fn new<F, Fut>(name: impl Into<String>, on_use: F) -> Self
    where
        F: Fn(Request, HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MiddlewareResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            version: "0.0.0".to_string(),
            description: None,
            use_hook: Arc::new(
                move |req: Request, ctx: HookContext| -> BoxFuture<'static, MiddlewareResult> {
                    Box::pin(on_use(req, ctx))
                },
            ),
            error_hook: None,
            register_hook: None,
        }
    }

    /// Sets the version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the server error hook.
    #[must_use]
    pub fn on_server_error<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(BoxError, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MiddlewareResult> + Send + 'static,
    {
        self.error_hook = Some(Arc::new(
            move |err: BoxError, req: Request| -> BoxFuture<'static, MiddlewareResult> {
                Box::pin(hook(err, req))
            },
        ));
        self
    }

    /// Sets the hook called once after startup installed every route and plugin.
    #[must_use]
    pub fn on_register(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.register_hook = Some(Arc::new(hook));
        self
    }

    /// The unique plugin name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plugin version.
    pub fn get_version(&self) -> &str {
        &self.version
    }

    /// The plugin description.
    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns true if the plugin handles server errors.
    pub fn has_server_error_hook(&self) -> bool {
        self.error_hook.is_some()
    }

    /// Invokes `on_use`.
    pub fn call_use(&self, req: Request, ctx: HookContext) -> BoxFuture<'static, MiddlewareResult> {
        (self.use_hook)(req, ctx)
    }

    pub(crate) fn call_register(&self) {
        if let Some(hook) = &self.register_hook {
            hook();
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("description", &self.description)
            .field("on_server_error", &self.error_hook.is_some())
            .field("on_register", &self.register_hook.is_some())
            .finish()
    }
}

/// Installs a plugin's `on_use` hook as pipeline middleware.
pub(crate) struct PluginUse(pub(crate) Plugin);

impl Middleware for PluginUse {
    fn before<'a>(&'a self, req: Request) -> BoxFuture<'a, MiddlewareResult> {
        self.0.call_use(req, HookContext::default())
    }
}

/// Installs a plugin's `on_server_error` hook as error middleware.
pub(crate) struct PluginServerError(pub(crate) Plugin);

impl ErrorMiddleware for PluginServerError {
    fn on_error<'a>(&'a self, err: BoxError, req: Request) -> BoxFuture<'a, MiddlewareResult> {
        match &self.0.error_hook {
            Some(hook) => hook(err, req),
            None => Box::pin(async move { MiddlewareResult::Error(req, err) }),
        }
    }
}
