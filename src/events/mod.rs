//! # Events Module
//!
//! The lifecycle hook chain. Every resource owns an [`EventDispatcher`] holding one
//! ordered listener list per [`LifecycleEvent`]; the controller triggers those lists
//! around each persistence call.
//!
//! ## Dispatch Modes
//!
//! - **No listeners**: [`EventDispatcher::trigger`] runs the terminal step immediately.
//! - **Fire-and-forget**: [`EventDispatcher::notify`] runs every listener with only the
//!   value. Outcomes are ignored and there is no terminal step.
//! - **Chained**: [`EventDispatcher::trigger`] runs listeners strictly one at a time.
//!   Each returns an [`Outcome`]: `Continue` moves on, `Respond` sends its status and
//!   body and stops the chain. When every listener continues the terminal step runs
//!   exactly once.
//!
//! ```rust
//! use crudhook::events::{EventDispatcher, LifecycleEvent, Outcome};
//! use serde_json::json;
//!
//! let mut events = EventDispatcher::new("widgets");
//! events.add_listener(LifecycleEvent::Validate, |args| {
//!     match args.value.get("name") {
//!         Some(_) => Outcome::Continue,
//!         None => Outcome::respond(400, json!({ "error": "invalid" })),
//!     }
//! });
//! assert_eq!(events.listener_count(LifecycleEvent::Validate), 1);
//! ```
//!
//! ## Ordering
//!
//! Registration order is invocation order. A chain is never reordered or run in
//! parallel, and at most one response leaves a request: the [`ResponseSink`]
//! rejects a second send with [`DispatchError::AlreadyResponded`].
//!
//! [`ResponseSink`]: crate::context::ResponseSink

mod core;

pub use core::{
    ChainOutcome, DispatchCursor, DispatchError, EventArgs, EventDispatcher, LifecycleEvent,
    Listener, ListenerRegistry, Outcome, UnknownEvent,
};
