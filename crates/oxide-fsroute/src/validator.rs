//! Bridge between request bodies and validation schemas.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

/// A structural validation definition.
///
/// `safe_parse` returns the accepted (possibly coerced) data, or the
/// schema's own structured error. It must not panic on bad input.
pub trait Schema: Send + Sync {
    /// Parses `input` without failing the caller.
    fn safe_parse(&self, input: &Value) -> Result<Value, Value>;
}

impl<F> Schema for F
where
    F: Fn(&Value) -> Result<Value, Value> + Send + Sync,
{
    fn safe_parse(&self, input: &Value) -> Result<Value, Value> {
        self(input)
    }
}

/// A schema backed by a serde type.
///
/// Input is accepted when it deserializes into `T`; the data handed on is
/// `T` serialized back, so unknown fields are dropped and `#[serde(default)]`
/// values are filled in.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
/// use oxide_fsroute::{validate, TypedSchema};
///
/// #[derive(Deserialize, Serialize)]
/// struct NewUser {
///     name: String,
/// }
///
/// let schema = TypedSchema::<NewUser>::new();
/// assert!(validate(&json!({"name": "a"}), &schema).is_ok());
/// assert!(!validate(&json!({}), &schema).is_ok());
/// ```
pub struct TypedSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    /// Creates the schema.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: DeserializeOwned + Serialize,
{
    fn safe_parse(&self, input: &Value) -> Result<Value, Value> {
        let parsed = T::deserialize(input).map_err(|e| {
            json!({
                "name": "ValidationError",
                "issues": [{ "message": e.to_string() }],
            })
        })?;
        serde_json::to_value(parsed).map_err(|e| {
            json!({
                "name": "SerializationError",
                "issues": [{ "message": e.to_string() }],
            })
        })
    }
}

/// Uniform outcome of a validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// The input was accepted.
    Success {
        /// The parsed and coerced data.
        data: Value,
    },
    /// The input was rejected.
    Failure {
        /// The schema's structured error, unmodified.
        error: Value,
    },
}

impl ValidationResult {
    /// Returns true on success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Converts into a `Result`.
    pub fn into_result(self) -> Result<Value, Value> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Failure { error } => Err(error),
        }
    }
}

/// Runs `schema` against `input`.
pub fn validate(input: &Value, schema: &dyn Schema) -> ValidationResult {
    match schema.safe_parse(input) {
        Ok(data) => ValidationResult::Success { data },
        Err(error) => ValidationResult::Failure { error },
    }
}
