//! # crudhook
//!
//! REST CRUD endpoints generated from declarative resource schemas, with an ordered,
//! short-circuiting hook chain around every lifecycle step.
//!
//! A resource is described by a [`schema::SchemaModel`]: a name, a collection URI,
//! a resource URI template and typed properties. For each resource a
//! [`controller::ResourceController`] exposes list, view, create, replace, update
//! and delete, and [`wire`] maps HTTP verbs onto them:
//!
//! | Request | Operation | Lifecycle events |
//! |---------|-----------|------------------|
//! | `GET /widgets` | list | `list` |
//! | `POST /widgets` | create | `validate`, `create` |
//! | `GET /widgets/{id}` | view | `view` |
//! | `PUT /widgets/{id}` | replace | `validate`, `update` |
//! | `PATCH /widgets/{id}` | update | `validate`, `update` |
//! | `DELETE /widgets/{id}` | delete | `delete` |
//!
//! Application code attaches listeners to those events. Listeners run one at a time
//! in registration order; each returns an [`events::Outcome`] that either continues
//! the chain or ends the request with its own status and body.
//!
//! ## Modules
//!
//! - **[`schema`]** - property kinds, schema models, YAML schema loading
//! - **[`coerce`]** - typed lookup keys from raw path parameters
//! - **[`events`]** - listener registry and dispatch protocol
//! - **[`controller`]** - CRUD operations wrapped in lifecycle triggers
//! - **[`wire`]** - verb and URI to operation mapping
//! - **[`router`]** - radix-tree path matching
//! - **[`store`]** - persistence trait and in-memory backend
//! - **[`server`]** - `may_minihttp` service
//! - **[`app`]** - resource registry and assembly from a service root
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - service plumbing
//!
//! ## Example
//!
//! ```rust,no_run
//! use crudhook::app::App;
//! use crudhook::events::{LifecycleEvent, Outcome};
//! use serde_json::json;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut app = App::from_root(Path::new("demos"))?;
//! if let Some(widgets) = app.collection_mut("widgets") {
//!     widgets.add_listener(LifecycleEvent::Validate, |args| {
//!         if args.value.get("name").and_then(|v| v.as_str()).is_some() {
//!             Outcome::Continue
//!         } else {
//!             Outcome::respond(400, json!({ "error": "invalid", "message": "name is required" }))
//!         }
//!     });
//! }
//! crudhook::cli::serve(app, "127.0.0.1:8080")?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod coerce;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod events;
pub mod ids;
pub mod logging;
pub mod router;
pub mod schema;
pub mod server;
pub mod store;
pub mod wire;

pub use app::App;
pub use context::{HandlerResponse, RequestContext, ResponseSink};
pub use error::{ErrorBody, ResourceError};
pub use events::{EventArgs, EventDispatcher, LifecycleEvent, Outcome};
pub use server::{AppService, HttpServer, ServerHandle};
