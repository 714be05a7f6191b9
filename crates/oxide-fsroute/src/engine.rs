//! The file router: scan, load, classify, register, serve.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::try_join_all;
use oxide_http::{
    serve, App, BoxFuture, Handler, JsonBodyParser, Method, Middleware, MiddlewareResult, Request,
    RequestTrace, Response, ServerHandle, SetHeader, UrlEncodedParser,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{RouterConfig, RouterOptions};
use crate::error::{FsRouteError, Result};
use crate::mapper::map_path;
use crate::module::{classify, ModuleLoader, RouteModule, RouteShape, UnresolvedRoute};
use crate::plugin::{HookContext, Plugin, PluginServerError, PluginUse, VALIDATOR_ERROR_PLUGIN};
use crate::scanner::{scan, RouteFile};
use crate::table::{MethodSet, RegisteredRoute, RouteTable, RouteTarget};
use crate::validator::{validate, Schema, ValidationResult};

/// Header set on every response.
pub const POWERED_BY_HEADER: &str = "X-Powered-By";

/// Value of [`POWERED_BY_HEADER`].
pub const POWERED_BY: &str = "oxide-fsroute";

/// Lifecycle of a [`FileRouter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Accepting plugins, extensions, and configuration.
    Configuring,
    /// Assembling the pipeline.
    Starting,
    /// Assembled; the route table is frozen.
    Running,
}

/// Builds an HTTP application from the files under `<routing_root>/router`.
///
/// Plugins, extensions, and options are accepted only before the router is
/// started. A failed start returns the router to
/// [`EngineState::Configuring`].
///
/// ```no_run
/// use oxide_fsroute::{FileRouter, ModuleRegistry, RouteModule, RouterOptions};
/// use oxide_http::Response;
///
/// # async fn run() -> oxide_fsroute::Result<()> {
/// let registry = ModuleRegistry::new()
///     .module("index.rs", RouteModule::new().handler(|_| async { Response::text("root") }));
///
/// let mut router = FileRouter::new("./app", registry);
/// router.configure(RouterOptions::new().json_body_parsing(true))?;
/// let server = router.start(8080).await?;
/// println!("listening on {}", server.local_addr());
/// # Ok(())
/// # }
/// ```
pub struct FileRouter {
    config: RouterConfig,
    loader: Arc<dyn ModuleLoader>,
    plugins: Vec<Plugin>,
    extensions: Vec<Arc<dyn Middleware>>,
    table: RouteTable,
    state: EngineState,
}

impl FileRouter {
    /// Creates a router over `routing_root`, resolving files with `loader`.
    pub fn new(routing_root: impl Into<PathBuf>, loader: impl ModuleLoader + 'static) -> Self {
        Self {
            config: RouterConfig::new(routing_root),
            loader: Arc::new(loader),
            plugins: Vec::new(),
            extensions: Vec::new(),
            table: RouteTable::default(),
            state: EngineState::Configuring,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Effective configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Committed routes; empty until started.
    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    /// Registered plugins in registration order.
    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    fn ensure_configuring(&self, action: &str) -> Result<()> {
        if self.state == EngineState::Configuring {
            Ok(())
        } else {
            Err(FsRouteError::CantRegister(format!(
                "cannot {action} while the router is {:?}",
                self.state
            )))
        }
    }

    /// Registers a plugin. Names must be unique.
    pub fn use_plugin(&mut self, plugin: Plugin) -> Result<&mut Self> {
        self.ensure_configuring("add a plugin")?;
        if self.plugins.iter().any(|p| p.name() == plugin.name()) {
            return Err(FsRouteError::CantRegister(format!(
                "plugin '{}' is already registered",
                plugin.name()
            )));
        }
        if self.config.development_logging {
            debug!(plugin = plugin.name(), version = plugin.get_version(), "plugin registered");
        }
        self.plugins.push(plugin);
        Ok(self)
    }

    /// Adds middleware that runs on every request before route dispatch.
    pub fn extend(&mut self, middleware: impl Middleware + 'static) -> Result<&mut Self> {
        self.ensure_configuring("extend the pipeline")?;
        self.extensions.push(Arc::new(middleware));
        Ok(self)
    }

    /// Overwrites every option present in `options`.
    pub fn configure(&mut self, options: RouterOptions) -> Result<&mut Self> {
        self.ensure_configuring("configure")?;
        self.config.apply(options)?;
        Ok(self)
    }

    /// Assembles the application without binding a listener.
    pub async fn build(&mut self) -> Result<Arc<App>> {
        let app = Arc::new(self.launch().await?);
        self.commit();
        Ok(app)
    }

    /// Assembles the application and serves it on `port` (0 picks one).
    pub async fn start(&mut self, port: u16) -> Result<ServerHandle> {
        let app = Arc::new(self.launch().await?);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let handle = match serve(app, addr).await {
            Ok(handle) => handle,
            Err(e) => {
                self.reset();
                return Err(e.into());
            }
        };
        self.commit();
        info!(addr = %handle.local_addr(), routes = self.table.len(), "server listening");
        Ok(handle)
    }

    async fn launch(&mut self) -> Result<App> {
        self.ensure_configuring("start")?;
        self.state = EngineState::Starting;
        match self.assemble().await {
            Ok(app) => Ok(app),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Runs once nothing left in startup can fail.
    fn commit(&mut self) {
        for plugin in &self.plugins {
            plugin.call_register();
        }
        self.state = EngineState::Running;
    }

    fn reset(&mut self) {
        self.state = EngineState::Configuring;
        self.table = RouteTable::default();
    }

    async fn assemble(&mut self) -> Result<App> {
        let dev = self.config.development_logging;

        let mut app = App::new().middleware(SetHeader::new(POWERED_BY_HEADER, POWERED_BY));
        if dev {
            app = app.middleware(RequestTrace);
        }
        if self.config.json_body_parsing {
            app = app.middleware(JsonBodyParser);
        }
        if self.config.url_encoded_body_parsing {
            app = app.middleware(UrlEncodedParser);
        }
        if self.config.cors {
            app = with_cors(app)?;
        }
        for extension in &self.extensions {
            app = app.middleware_arc(extension.clone());
        }

        let table = self.register_routes().await?;

        let validate = self.config.validation_enabled;
        let on_invalid = self
            .plugins
            .iter()
            .find(|p| p.name() == VALIDATOR_ERROR_PLUGIN)
            .cloned();
        for route in &table {
            app = match &route.target {
                RouteTarget::Mount(router) => app.mount(&route.path, router.clone()),
                RouteTarget::Handler(handler) => app.middleware(RouteGuard {
                    path: route.path.clone(),
                    methods: route.methods.clone(),
                    handler: handler.clone(),
                    validator: route.validator.clone().filter(|_| validate),
                    on_invalid: on_invalid.clone(),
                }),
            };
        }

        for plugin in &self.plugins {
            app = app.middleware(PluginUse(plugin.clone()));
        }
        for plugin in self.plugins.iter().filter(|p| p.has_server_error_hook()) {
            app = app.error_middleware(Arc::new(PluginServerError(plugin.clone())));
        }
        if dev {
            debug!(layers = app.len(), plugins = self.plugins.len(), "pipeline assembled");
        }

        self.table = table;
        Ok(app)
    }

    async fn register_routes(&self) -> Result<RouteTable> {
        let root = self.config.routing_root();
        let files = scan(root)?;
        if self.config.development_logging {
            debug!(root = %root.display(), count = files.len(), "scanned route files");
        }

        let loader = &self.loader;
        let modules = try_join_all(files.iter().map(|file| async move {
            loader.load(file).await.map_err(|e| FsRouteError::Load {
                path: file.path.clone(),
                message: e.0,
            })
        }))
        .await?;

        let mut table = RouteTable::new(self.config.override_duplicate_routes);
        for (file, module) in files.iter().zip(modules) {
            let Some((path, shape, module)) = self.resolve(file, module)? else {
                continue;
            };
            for route in expand(&path, shape, &module) {
                table.add_route(route.with_source(&file.path))?;
            }
            info!(path = %path, file = %file.relative, "route loaded");
        }
        Ok(table)
    }

    fn resolve(
        &self,
        file: &RouteFile,
        module: Option<RouteModule>,
    ) -> Result<Option<(String, RouteShape, RouteModule)>> {
        let shape = module
            .as_ref()
            .ok_or(UnresolvedRoute::NotAModule)
            .and_then(classify);
        match (module, shape) {
            (Some(module), Ok(shape)) => {
                let path = map_path(&file.path, self.config.routing_root())?;
                Ok(Some((path, shape, module)))
            }
            (_, Err(reason)) => {
                warn!(file = %file.relative, %reason, "skipping unresolved route file");
                Ok(None)
            }
            (None, Ok(_)) => Ok(None),
        }
    }
}

impl std::fmt::Debug for FileRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRouter")
            .field("config", &self.config)
            .field("plugins", &self.plugins)
            .field("extensions", &self.extensions.len())
            .field("table", &self.table)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "cors")]
fn with_cors(app: App) -> Result<App> {
    Ok(app.middleware(oxide_http::CorsMiddleware::permissive()))
}

#[cfg(not(feature = "cors"))]
fn with_cors(_app: App) -> Result<App> {
    Err(FsRouteError::CantRegister(
        "cors requested but the `cors` feature is disabled".to_string(),
    ))
}

/// Table entries for one classified module.
fn expand(path: &str, shape: RouteShape, module: &RouteModule) -> Vec<RegisteredRoute> {
    let entry = |methods: MethodSet, handler: Handler| {
        RegisteredRoute::new(path, methods, RouteTarget::Handler(handler))
            .with_validator(module.validator.clone())
    };
    match shape {
        RouteShape::SubRouter(router) => {
            vec![RegisteredRoute::new(path, MethodSet::all(), RouteTarget::Mount(router))]
        }
        RouteShape::PerMethod(handlers) => handlers
            .into_iter()
            .map(|(method, handler)| entry(method.into(), handler))
            .collect(),
        RouteShape::MethodList { methods, handler } => vec![entry(methods.into(), handler)],
        RouteShape::Bare(handler) => vec![entry(MethodSet::all(), handler)],
    }
}

/// Dispatches to one handler when path and method match.
struct RouteGuard {
    path: String,
    methods: MethodSet,
    handler: Handler,
    validator: Option<Arc<dyn Schema>>,
    on_invalid: Option<Plugin>,
}

impl RouteGuard {
    fn matches(&self, req: &Request) -> bool {
        let path = match req.path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        path == self.path && self.methods.contains(req.method)
    }

    async fn reject(&self, req: Request, error: Value) -> MiddlewareResult {
        match &self.on_invalid {
            Some(plugin) => {
                let ctx = HookContext {
                    validation_error: Some(error),
                };
                plugin.call_use(req, ctx).await
            }
            None => MiddlewareResult::Response(
                Response::json(&json!({ "message": "Validation error.", "error": error }))
                    .status(400),
            ),
        }
    }
}

impl Middleware for RouteGuard {
    fn before<'a>(&'a self, mut req: Request) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            if !self.matches(&req) {
                return MiddlewareResult::Continue(req);
            }
            if let Some(schema) = self.validator.as_deref().filter(|_| req.method != Method::Get) {
                let input = req.parsed_body.clone().unwrap_or(Value::Null);
                match validate(&input, schema) {
                    ValidationResult::Success { data } => req.parsed_body = Some(data),
                    ValidationResult::Failure { error } => return self.reject(req, error).await,
                }
            }
            self.handler.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleRegistry;

    fn guard(methods: impl Into<MethodSet>, validator: Option<Arc<dyn Schema>>) -> RouteGuard {
        RouteGuard {
            path: "/users".to_string(),
            methods: methods.into(),
            handler: Handler::new(|req: Request| async move {
                Response::json(&req.parsed_body.unwrap_or(Value::Null))
            }),
            validator,
            on_invalid: None,
        }
    }

    fn require_name() -> Arc<dyn Schema> {
        Arc::new(|input: &Value| {
            if input.get("name").is_some_and(Value::is_string) {
                Ok(json!({ "name": input["name"] }))
            } else {
                Err(json!({ "issues": ["name is required"] }))
            }
        })
    }

    #[tokio::test]
    async fn test_guard_passes_other_paths_and_methods() {
        let guard = guard(Method::Post, None);
        assert!(matches!(
            guard.before(Request::get("/users")).await,
            MiddlewareResult::Continue(_)
        ));
        assert!(matches!(
            guard.before(Request::post("/users/1")).await,
            MiddlewareResult::Continue(_)
        ));
        assert!(matches!(
            guard.before(Request::post("/users/")).await,
            MiddlewareResult::Response(_)
        ));
    }

    #[tokio::test]
    async fn test_guard_rejects_invalid_body() {
        let guard = guard(Method::Post, Some(require_name()));
        let mut req = Request::post("/users");
        req.parsed_body = Some(json!({ "age": 3 }));

        let res = guard.before(req).await.into_response().unwrap();
        assert_eq!(res.status, 400);
        assert_eq!(
            res.body_json(),
            Some(json!({
                "message": "Validation error.",
                "error": { "issues": ["name is required"] }
            }))
        );
    }

    #[tokio::test]
    async fn test_guard_replaces_body_with_coerced_data() {
        let guard = guard(Method::Post, Some(require_name()));
        let mut req = Request::post("/users");
        req.parsed_body = Some(json!({ "name": "ada", "extra": 1 }));

        let res = guard.before(req).await.into_response().unwrap();
        assert_eq!(res.body_json(), Some(json!({ "name": "ada" })));
    }

    #[tokio::test]
    async fn test_guard_skips_validation_for_get() {
        let guard = guard(Method::Get, Some(require_name()));
        let res = guard.before(Request::get("/users")).await.into_response().unwrap();
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn test_configuration_rejected_after_build() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("router")).unwrap();

        let mut router = FileRouter::new(dir.path(), ModuleRegistry::new());
        router.build().await.unwrap();
        assert_eq!(router.state(), EngineState::Running);

        assert!(matches!(
            router.configure(RouterOptions::new()),
            Err(FsRouteError::CantRegister(_))
        ));
        assert!(matches!(router.extend(RequestTrace), Err(FsRouteError::CantRegister(_))));
        assert!(matches!(router.build().await, Err(FsRouteError::CantRegister(_))));
    }

    #[tokio::test]
    async fn test_failed_start_returns_to_configuring() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = FileRouter::new(dir.path(), ModuleRegistry::new());

        assert!(matches!(
            router.build().await,
            Err(FsRouteError::FileSystem { .. })
        ));
        assert_eq!(router.state(), EngineState::Configuring);
        assert!(router.configure(RouterOptions::new().cors(false)).is_ok());
    }
}
