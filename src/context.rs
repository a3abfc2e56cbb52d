//! Per-request state shared by the controller and the listeners it triggers.
//!
//! A [`RequestContext`] and a [`ResponseSink`] are created for every inbound request
//! and dropped once its single response has been written.

use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::error;

use crate::coerce::LookupKey;
use crate::events::DispatchError;
use crate::ids::RequestId;
use crate::router::ParamVec;

/// Request data visible to lifecycle listeners.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// Name of the resource the request targets
    pub resource: String,
    pub method: Method,
    pub path: String,
    /// Raw path parameters extracted from the URL
    pub path_params: ParamVec,
    pub query_params: HashMap<String, String>,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Coerced lookup key for resource URIs
    pub key: Option<LookupKey>,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    /// Record resolved by the lookup key, before any mutation
    pub record: Option<Value>,
}

impl RequestContext {
    #[must_use]
    pub fn new(resource: &str, method: Method, path: &str) -> Self {
        Self {
            request_id: RequestId::new(),
            resource: resource.to_string(),
            method,
            path: path.to_string(),
            path_params: ParamVec::new(),
            query_params: HashMap::new(),
            headers: HashMap::new(),
            key: None,
            body: None,
            record: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Get a path parameter by name (last occurrence wins).
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Get a header by name (case-insensitive)
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The request body, or an empty object when none was sent.
    #[must_use]
    pub fn payload(&self) -> Value {
        self.body
            .clone()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
    }
}

/// Final status and JSON body of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// Response body as JSON
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Single-slot response holder for one request.
///
/// The first [`send`](ResponseSink::send) wins; any later attempt is a listener or
/// controller defect and is rejected with [`DispatchError::AlreadyResponded`].
#[derive(Debug, Default)]
pub struct ResponseSink {
    response: Option<HandlerResponse>,
}

impl ResponseSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, status: u16, body: Value) -> Result<(), DispatchError> {
        if let Some(first) = &self.response {
            error!(
                first_status = first.status,
                attempted_status = status,
                "Second response attempted for one request - ignored"
            );
            return Err(DispatchError::AlreadyResponded {
                first_status: first.status,
                attempted_status: status,
            });
        }
        self.response = Some(HandlerResponse::json(status, body));
        Ok(())
    }

    pub fn send_ok(&mut self, body: Value) -> Result<(), DispatchError> {
        self.send(200, body)
    }

    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.response.is_some()
    }

    #[must_use]
    pub fn response(&self) -> Option<&HandlerResponse> {
        self.response.as_ref()
    }

    #[must_use]
    pub fn into_response(self) -> Option<HandlerResponse> {
        self.response
    }
}
