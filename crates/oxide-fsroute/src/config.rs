//! Router configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{FsRouteError, Result};

/// Effective configuration of a [`FileRouter`](crate::FileRouter).
///
/// Every flag defaults to off. The routing root comes from construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Emit diagnostic `debug!` output and trace each request.
    pub development_logging: bool,
    /// Install the JSON body parser.
    pub json_body_parsing: bool,
    /// Install the URL-encoded body parser.
    pub url_encoded_body_parsing: bool,
    /// Install permissive CORS.
    pub cors: bool,
    /// Check request bodies against exported validators.
    pub validation_enabled: bool,
    /// Let route files share a path and method.
    pub override_duplicate_routes: bool,
    /// Directory containing `router/`.
    pub routing_root: PathBuf,
}

impl RouterConfig {
    /// Creates a configuration with every flag off.
    pub fn new(routing_root: impl Into<PathBuf>) -> Self {
        Self {
            development_logging: false,
            json_body_parsing: false,
            url_encoded_body_parsing: false,
            cors: false,
            validation_enabled: false,
            override_duplicate_routes: false,
            routing_root: routing_root.into(),
        }
    }

    /// The routing root.
    pub fn routing_root(&self) -> &Path {
        &self.routing_root
    }

    /// Overwrites every option present in `options`.
    pub fn apply(&mut self, options: RouterOptions) -> Result<()> {
        if options.cors == Some(true) && !cfg!(feature = "cors") {
            return Err(FsRouteError::CantRegister(
                "cors requested but the `cors` feature is disabled".to_string(),
            ));
        }

        let RouterOptions {
            development_logging,
            json_body_parsing,
            url_encoded_body_parsing,
            cors,
            validation_enabled,
            override_duplicate_routes,
            routing_root,
        } = options;

        set(&mut self.development_logging, development_logging);
        set(&mut self.json_body_parsing, json_body_parsing);
        set(&mut self.url_encoded_body_parsing, url_encoded_body_parsing);
        set(&mut self.cors, cors);
        set(&mut self.validation_enabled, validation_enabled);
        set(&mut self.override_duplicate_routes, override_duplicate_routes);
        set(&mut self.routing_root, routing_root);
        Ok(())
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// A partial configuration update.
///
/// Absent fields leave the current value untouched. Deserializes from
/// snake_case or camelCase keys:
///
/// ```
/// use oxide_fsroute::RouterOptions;
///
/// let options: RouterOptions =
///     serde_json::from_str(r#"{"useJsonMode": true, "enableValidator": true}"#).unwrap();
/// assert_eq!(options.json_body_parsing, Some(true));
/// assert_eq!(options.validation_enabled, Some(true));
/// assert_eq!(options.cors, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    #[serde(alias = "developmentLogging", alias = "isDev")]
    pub development_logging: Option<bool>,
    #[serde(alias = "jsonBodyParsing", alias = "useJsonMode")]
    pub json_body_parsing: Option<bool>,
    #[serde(alias = "urlEncodedBodyParsing", alias = "useUrlEncoded")]
    pub url_encoded_body_parsing: Option<bool>,
    #[serde(alias = "useCors")]
    pub cors: Option<bool>,
    #[serde(alias = "validationEnabled", alias = "enableValidator")]
    pub validation_enabled: Option<bool>,
    #[serde(alias = "overrideDuplicateRoutes", alias = "OVERRIDE_HTTP_METHOD")]
    pub override_duplicate_routes: Option<bool>,
    #[serde(alias = "routingRoot", alias = "dirname")]
    pub routing_root: Option<PathBuf>,
}

impl RouterOptions {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets development logging.
    #[must_use]
    pub fn development_logging(mut self, on: bool) -> Self {
        self.development_logging = Some(on);
        self
    }

    /// Sets JSON body parsing.
    #[must_use]
    pub fn json_body_parsing(mut self, on: bool) -> Self {
        self.json_body_parsing = Some(on);
        self
    }

    /// Sets URL-encoded body parsing.
    #[must_use]
    pub fn url_encoded_body_parsing(mut self, on: bool) -> Self {
        self.url_encoded_body_parsing = Some(on);
        self
    }

    /// Sets CORS.
    #[must_use]
    pub fn cors(mut self, on: bool) -> Self {
        self.cors = Some(on);
        self
    }

    /// Sets request body validation.
    #[must_use]
    pub fn validation_enabled(mut self, on: bool) -> Self {
        self.validation_enabled = Some(on);
        self
    }

    /// Sets override mode for duplicate routes.
    #[must_use]
    pub fn override_duplicate_routes(mut self, on: bool) -> Self {
        self.override_duplicate_routes = Some(on);
        self
    }

    /// Replaces the routing root.
    #[must_use]
    pub fn routing_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.routing_root = Some(root.into());
        self
    }
}
