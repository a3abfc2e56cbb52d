//! Route wiring: which verb on which URI reaches which controller operation.
//!
//! Every resource gets the same six routes, in a fixed order:
//!
//! | Verb | URI | Operation |
//! |------|-----|-----------|
//! | `GET` | collection | list |
//! | `POST` | collection | create |
//! | `GET` | resource | view |
//! | `PUT` | resource | replace |
//! | `PATCH` | resource | update |
//! | `DELETE` | resource | delete |
//!
//! Resource-URI operations coerce their path parameters through the controller's
//! [`ParameterCoercer`](crate::coerce::ParameterCoercer) before anything else runs.

use http::Method;
use std::fmt;
use std::sync::Arc;

use crate::context::{RequestContext, ResponseSink};
use crate::controller::ResourceController;
use crate::error::ResourceError;
use crate::router::RouteMeta;
use crate::schema::SchemaModel;

/// A controller operation reachable over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    View,
    Replace,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::List,
        Operation::Create,
        Operation::View,
        Operation::Replace,
        Operation::Update,
        Operation::Delete,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::View => "view",
            Operation::Replace => "replace",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Operation::List | Operation::View => Method::GET,
            Operation::Create => Method::POST,
            Operation::Replace => Method::PUT,
            Operation::Update => Method::PATCH,
            Operation::Delete => Method::DELETE,
        }
    }

    /// Served on the resource URI rather than the collection URI.
    #[must_use]
    pub fn is_resource_route(self) -> bool {
        !matches!(self, Operation::List | Operation::Create)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six routes for one schema, in wiring order.
#[must_use]
pub fn routes_for(schema: &SchemaModel) -> Vec<RouteMeta> {
    let resource: Arc<str> = Arc::from(schema.name.as_str());
    Operation::ALL
        .into_iter()
        .map(|operation| RouteMeta {
            method: operation.method(),
            path_pattern: if operation.is_resource_route() {
                schema.resource_uri.clone()
            } else {
                schema.collection_uri.clone()
            },
            resource: Arc::clone(&resource),
            operation,
        })
        .collect()
}

/// Run `operation` on `controller` for one request.
pub fn invoke(
    controller: &ResourceController,
    operation: Operation,
    ctx: &mut RequestContext,
    sink: &mut ResponseSink,
) -> Result<(), ResourceError> {
    match operation {
        Operation::List => controller.list(ctx, sink),
        Operation::Create => controller.create(ctx, sink),
        Operation::View => controller.view(ctx, sink),
        Operation::Replace => controller.replace(ctx, sink),
        Operation::Update => controller.update(ctx, sink),
        Operation::Delete => controller.delete(ctx, sink),
    }
}
