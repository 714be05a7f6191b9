//! Error types for file routing.

use std::path::PathBuf;

use oxide_http::{HttpError, Method};

/// Errors raised while configuring or starting a [`FileRouter`](crate::FileRouter).
#[derive(Debug, thiserror::Error)]
pub enum FsRouteError {
    /// Registration or configuration is not possible in the current state.
    #[error("cannot register: {0}")]
    CantRegister(String),

    /// Two route files claim the same path and method.
    #[error("duplicate route {path} for {}", format_methods(.methods))]
    DuplicateRoute {
        /// The canonical URL path.
        path: String,
        /// The overlapping methods.
        methods: Vec<Method>,
    },

    /// The routing root is missing or unreadable.
    #[error("cannot read routing directory '{}': {source}", .path.display())]
    FileSystem {
        /// The directory that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A path handed to the mapper is not inside `<root>/router`.
    #[error("'{}' is not inside the router directory", .0.display())]
    OutsideRoutingRoot(PathBuf),

    /// The module loader failed on a route file.
    #[error("failed to load route module '{}': {message}", .path.display())]
    Load {
        /// The route file.
        path: PathBuf,
        /// Loader-provided reason.
        message: String,
    },

    /// The listener failed.
    #[error(transparent)]
    Server(#[from] HttpError),
}

fn format_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for file routing operations.
pub type Result<T> = std::result::Result<T, FsRouteError>;
