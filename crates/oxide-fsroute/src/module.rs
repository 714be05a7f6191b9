//! Route module exports, loading, and classification.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use oxide_http::{BoxFuture, Handler, Method, Router};

use crate::scanner::RouteFile;
use crate::validator::Schema;

/// The default export of a route module.
#[derive(Clone, Debug)]
pub enum DefaultExport {
    /// A single request handler.
    Handler(Handler),
    /// A composed router that manages its own sub-paths and methods.
    Router(Arc<Router>),
}

/// The `config` export of a route module.
///
/// Either a `method` list applying to the default handler, per-method
/// handlers, or both; per-method handlers take precedence.
#[derive(Clone, Debug, Default)]
pub struct RouteConfig {
    /// Methods the default handler answers.
    pub method: Option<Vec<Method>>,
    /// Independent handlers keyed by method, in declaration order.
    pub handlers: Vec<(Method, Handler)>,
}

/// Everything a route file exports.
#[derive(Clone, Default)]
pub struct RouteModule {
    /// The default export.
    pub default: Option<DefaultExport>,
    /// The optional `config` export.
    pub config: Option<RouteConfig>,
    /// The optional body schema.
    pub validator: Option<Arc<dyn Schema>>,
}

impl RouteModule {
    /// Creates a module with no exports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exports a default handler answering with a [`Response`](oxide_http::Response).
    #[must_use]
    pub fn handler<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(oxide_http::Request) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = oxide_http::Response> + Send + 'static,
    {
        self.default_export(DefaultExport::Handler(Handler::new(handler)))
    }

    /// Exports a composed router as the default.
    #[must_use]
    pub fn router(self, router: Router) -> Self {
        self.default_export(DefaultExport::Router(Arc::new(router)))
    }

    /// Sets the default export.
    #[must_use]
    pub fn default_export(mut self, export: DefaultExport) -> Self {
        self.default = Some(export);
        self
    }

    /// Sets `config.method`.
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.config.get_or_insert_with(RouteConfig::default).method =
            Some(methods.into_iter().collect());
        self
    }

    /// Adds a per-method handler to `config`, replacing one for the same method.
    #[must_use]
    pub fn on(mut self, method: Method, handler: Handler) -> Self {
        let handlers = &mut self.config.get_or_insert_with(RouteConfig::default).handlers;
        handlers.retain(|(m, _)| *m != method);
        handlers.push((method, handler));
        self
    }

    /// Exports a body schema.
    #[must_use]
    pub fn validator(mut self, schema: impl Schema + 'static) -> Self {
        self.validator = Some(Arc::new(schema));
        self
    }
}

impl fmt::Debug for RouteModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteModule")
            .field("default", &self.default)
            .field("config", &self.config)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Error returned by a [`ModuleLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError(pub String);

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for LoadError {}

/// Resolves a discovered file into its exports.
pub trait ModuleLoader: Send + Sync {
    /// Loads `file`; `Ok(None)` means the file is not a route module.
    fn load<'a>(&'a self, file: &'a RouteFile) -> BoxFuture<'a, Result<Option<RouteModule>, LoadError>>;
}

/// A loader backed by modules registered in code, keyed by router-relative path.
///
/// ```
/// use oxide_fsroute::{ModuleRegistry, RouteModule};
/// use oxide_http::Response;
///
/// let registry = ModuleRegistry::new()
///     .module("index.rs", RouteModule::new().handler(|_| async { Response::text("root") }));
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, RouteModule>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the exports of the file at `relative` (e.g. `users/create.ts`).
    #[must_use]
    pub fn module(mut self, relative: &str, module: RouteModule) -> Self {
        self.insert(relative, module);
        self
    }

    /// Registers exports in place.
    pub fn insert(&mut self, relative: &str, module: RouteModule) {
        let key = relative.trim_start_matches('/').replace('\\', "/");
        self.modules.insert(key, module);
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load<'a>(&'a self, file: &'a RouteFile) -> BoxFuture<'a, Result<Option<RouteModule>, LoadError>> {
        Box::pin(async move { Ok(self.modules.get(&file.relative).cloned()) })
    }
}

/// The route shape of a classified module.
#[derive(Clone, Debug)]
pub enum RouteShape {
    /// Mount a composed router at the path.
    SubRouter(Arc<Router>),
    /// One independent handler per method.
    PerMethod(Vec<(Method, Handler)>),
    /// One handler restricted to a method list.
    MethodList {
        /// Accepted methods (non-empty).
        methods: Vec<Method>,
        /// The default handler.
        handler: Handler,
    },
    /// One handler for every method.
    Bare(Handler),
}

/// Why a module produced no route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedRoute {
    /// The loader did not recognize the file as a route module.
    NotAModule,
    /// No default export and no per-method handlers.
    NoHandler,
    /// `config.method` is present but empty.
    EmptyMethodList,
    /// `config` exports neither a method list nor handlers.
    EmptyConfig,
}

impl fmt::Display for UnresolvedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotAModule => "not a route module",
            Self::NoHandler => "no callable export",
            Self::EmptyMethodList => "config.method is empty",
            Self::EmptyConfig => "config exports neither a method list nor handlers",
        })
    }
}

/// Decides the route shape of a module's exports.
///
/// Priority: composed router, per-method handlers, method list with the
/// default handler, bare default handler.
pub fn classify(module: &RouteModule) -> Result<RouteShape, UnresolvedRoute> {
    let default_handler = match &module.default {
        Some(DefaultExport::Router(router)) => return Ok(RouteShape::SubRouter(router.clone())),
        Some(DefaultExport::Handler(handler)) => Some(handler),
        None => None,
    };

    match (&module.config, default_handler) {
        (Some(config), _) if !config.handlers.is_empty() => {
            Ok(RouteShape::PerMethod(config.handlers.clone()))
        }
        (Some(RouteConfig { method: Some(methods), .. }), Some(handler)) => {
            if methods.is_empty() {
                Err(UnresolvedRoute::EmptyMethodList)
            } else {
                Ok(RouteShape::MethodList {
                    methods: methods.clone(),
                    handler: handler.clone(),
                })
            }
        }
        (Some(RouteConfig { method: None, .. }), Some(_)) => Err(UnresolvedRoute::EmptyConfig),
        (None, Some(handler)) => Ok(RouteShape::Bare(handler.clone())),
        (_, None) => Err(UnresolvedRoute::NoHandler),
    }
}
