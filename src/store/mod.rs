//! # Store Module
//!
//! The persistence collaborator. The controller only ever talks to a
//! [`Persistence`] implementation; [`MemoryStore`] is the backend shipped with the
//! service.
//!
//! Every call is synchronous and attempted once. Calls run on the request's
//! coroutine, so a backend doing blocking I/O should use `may`'s primitives to
//! yield rather than park the worker thread.

mod memory;

pub use memory::MemoryStore;

use serde_json::Value;
use thiserror::Error;

use crate::coerce::LookupKey;

/// Failure reported by a persistence backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("{0}")]
    Backend(String),

    /// A write payload was not a JSON object.
    #[error("payload must be a JSON object, got {0}")]
    InvalidPayload(&'static str),

    /// The record handed to an update or remove no longer exists.
    #[error("record no longer present in {0}")]
    Missing(String),

    /// A new record's identity is already stored.
    #[error("record with the same identity already exists in {0}")]
    Duplicate(String),

    /// A lock guarding the backend was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }

    /// Opaque details forwarded in the `details` field of the error body.
    #[must_use]
    pub fn details(&self) -> Option<Value> {
        match self {
            StoreError::Backend(message) => Some(Value::String(message.clone())),
            StoreError::InvalidPayload(_)
            | StoreError::Missing(_)
            | StoreError::Duplicate(_)
            | StoreError::Poisoned => None,
        }
    }
}

/// Storage operations a resource controller needs.
///
/// `find_one` returns `Ok(None)` on a miss; only real failures are errors.
pub trait Persistence: Send + Sync {
    /// Up to `limit` records in storage order.
    fn list(&self, limit: usize) -> Result<Vec<Value>, StoreError>;

    fn find_one(&self, key: &LookupKey) -> Result<Option<Value>, StoreError>;

    /// Insert a new record and return it as stored.
    fn create(&self, payload: &Value) -> Result<Value, StoreError>;

    /// Insert or fully replace the record identified by the payload's key fields.
    fn upsert(&self, payload: &Value) -> Result<Value, StoreError>;

    /// Merge `payload` into an existing `record` and return the result.
    fn apply_partial(&self, record: &Value, payload: &Value) -> Result<Value, StoreError>;

    /// Remove `record`.
    fn remove(&self, record: &Value) -> Result<(), StoreError>;
}

/// Short JSON type name used in error messages.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
