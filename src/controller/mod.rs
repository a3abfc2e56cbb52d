//! # Controller Module
//!
//! [`ResourceController`] binds one [`SchemaModel`](crate::schema::SchemaModel) to a
//! [`Persistence`](crate::store::Persistence) backend and exposes the six CRUD
//! operations. Every operation follows the same fixed sequence:
//!
//! 1. resolve input (coerce path parameters, load the target record)
//! 2. mutating operations only: trigger `validate` with the request body
//! 3. the persistence call
//! 4. trigger the operation's own lifecycle event
//! 5. send the success response, unless a listener already responded
//!
//! Any error ends the request with exactly one error response; later steps are
//! skipped and nothing is retried.

mod core;

pub use core::{ResourceController, DEFAULT_LIST_LIMIT};
