//! # Error Taxonomy
//!
//! Every request-terminating failure is a [`ResourceError`]. Each variant maps to
//! one HTTP status and one short error code, and renders to the JSON error body
//! `{ "error": <code>, "message": <text>, "details"?: <opaque> }`.
//!
//! | Variant | Status | Code |
//! |---------|--------|------|
//! | `UnknownProperty` | 500 | `nosuchproperty` |
//! | `InvalidParameter` | 400 | `invalidparam` |
//! | `NotFound` | 404 | `notfound` |
//! | `Persistence` | 500 | `persistence` |
//! | `Dispatch` | 500 | `internal` |
//!
//! A `validate` listener rejecting a request is not an error value: its
//! [`Outcome::Respond`](crate::events::Outcome) is sent verbatim.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::events::DispatchError;
use crate::store::StoreError;

/// Failure that ends the current request with exactly one error response.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A path parameter names a field the resource schema does not declare.
    #[error("No such property {property} on resource {resource}")]
    UnknownProperty { property: String, resource: String },

    /// A numeric path parameter failed to parse while strict coercion is enabled.
    #[error("Invalid value {value:?} for numeric property {property}")]
    InvalidParameter { property: String, value: String },

    /// No record matches the coerced lookup key.
    #[error("Resource not found.")]
    NotFound,

    /// The persistence collaborator reported an error.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// A listener or operation attempted to send a second response.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ResourceError {
    /// HTTP status used when this error is rendered as a response.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            ResourceError::UnknownProperty { .. } => 500,
            ResourceError::InvalidParameter { .. } => 400,
            ResourceError::NotFound => 404,
            ResourceError::Persistence(_) => 500,
            ResourceError::Dispatch(_) => 500,
        }
    }

    /// Short machine-readable code placed in the `error` field.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ResourceError::UnknownProperty { .. } => "nosuchproperty",
            ResourceError::InvalidParameter { .. } => "invalidparam",
            ResourceError::NotFound => "notfound",
            ResourceError::Persistence(_) => "persistence",
            ResourceError::Dispatch(_) => "internal",
        }
    }

    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let details = match self {
            ResourceError::Persistence(err) => err.details(),
            _ => None,
        };
        ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
            details,
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
