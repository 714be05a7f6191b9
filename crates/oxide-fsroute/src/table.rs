//! Registry of committed routes with duplicate detection.

use std::path::PathBuf;
use std::sync::Arc;

use oxide_http::{Handler, Method, Router};

use crate::error::{FsRouteError, Result};
use crate::validator::Schema;

/// A normalized set of HTTP methods.
///
/// Always held in list form: deduplicated and in canonical order, so a
/// single method is a one-element list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSet(Vec<Method>);

impl MethodSet {
    /// Builds a set from any methods, removing duplicates.
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        let mut methods: Vec<Method> = methods.into_iter().collect();
        methods.sort();
        methods.dedup();
        Self(methods)
    }

    /// Every supported method.
    pub fn all() -> Self {
        Self::new(Method::ALL)
    }

    /// Returns true if `method` is in the set.
    pub fn contains(&self, method: Method) -> bool {
        self.0.contains(&method)
    }

    /// Methods present in both sets.
    pub fn intersection(&self, other: &Self) -> Vec<Method> {
        self.0
            .iter()
            .copied()
            .filter(|m| other.contains(*m))
            .collect()
    }

    /// The methods as a slice.
    pub fn as_slice(&self) -> &[Method] {
        &self.0
    }

    /// Number of methods.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Method> for MethodSet {
    fn from(method: Method) -> Self {
        Self(vec![method])
    }
}

impl From<Vec<Method>> for MethodSet {
    fn from(methods: Vec<Method>) -> Self {
        Self::new(methods)
    }
}

impl<const N: usize> From<[Method; N]> for MethodSet {
    fn from(methods: [Method; N]) -> Self {
        Self::new(methods)
    }
}

/// What a registered route dispatches to.
#[derive(Clone, Debug)]
pub enum RouteTarget {
    /// A handler guarded by path and method.
    Handler(Handler),
    /// A sub-router mounted at the route path; it filters its own methods.
    Mount(Arc<Router>),
}

/// A committed route.
#[derive(Clone)]
pub struct RegisteredRoute {
    /// Canonical URL path.
    pub path: String,
    /// Methods the route answers.
    pub methods: MethodSet,
    /// Dispatch target.
    pub target: RouteTarget,
    /// Body schema checked before the handler, when validation is on.
    pub validator: Option<Arc<dyn Schema>>,
    /// The route file this came from.
    pub source: Option<PathBuf>,
}

impl RegisteredRoute {
    /// Creates a route without validator or source.
    pub fn new(path: impl Into<String>, methods: impl Into<MethodSet>, target: RouteTarget) -> Self {
        Self {
            path: path.into(),
            methods: methods.into(),
            target,
            validator: None,
            source: None,
        }
    }

    /// Attaches a validation schema.
    #[must_use]
    pub fn with_validator(mut self, validator: Option<Arc<dyn Schema>>) -> Self {
        self.validator = validator;
        self
    }

    /// Records the originating route file.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl std::fmt::Debug for RegisteredRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredRoute")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("target", &self.target)
            .field("validated", &self.validator.is_some())
            .field("source", &self.source)
            .finish()
    }
}

/// Ordered registry of routes.
///
/// Two routes conflict when their paths are exactly equal and their method
/// sets intersect. With override mode on, conflicts are accepted and the
/// routes coexist in registration order.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RegisteredRoute>,
    allow_override: bool,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new(allow_override: bool) -> Self {
        Self {
            routes: Vec::new(),
            allow_override,
        }
    }

    /// Methods of `methods` already registered at exactly `path`.
    pub fn conflicting_methods(&self, path: &str, methods: &MethodSet) -> Vec<Method> {
        MethodSet::new(
            self.routes
                .iter()
                .filter(|r| r.path == path)
                .flat_map(|r| r.methods.intersection(methods)),
        )
        .0
    }

    /// Returns true if registering `methods` at `path` would collide.
    pub fn has_conflict(&self, path: &str, methods: &MethodSet) -> bool {
        !self.conflicting_methods(path, methods).is_empty()
    }

    /// Appends a route, rejecting collisions unless override mode is on.
    pub fn add_route(&mut self, route: RegisteredRoute) -> Result<()> {
        if !self.allow_override {
            let overlap = self.conflicting_methods(&route.path, &route.methods);
            if !overlap.is_empty() {
                return Err(FsRouteError::DuplicateRoute {
                    path: route.path,
                    methods: overlap,
                });
            }
        }
        self.routes.push(route);
        Ok(())
    }

    /// Routes in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, RegisteredRoute> {
        self.routes.iter()
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a RegisteredRoute;
    type IntoIter = std::slice::Iter<'a, RegisteredRoute>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
