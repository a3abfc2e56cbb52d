use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::context::{RequestContext, ResponseSink};

/// The fixed set of lifecycle events a resource exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    List,
    View,
    Create,
    Update,
    Validate,
    Delete,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 6] = [
        LifecycleEvent::List,
        LifecycleEvent::View,
        LifecycleEvent::Create,
        LifecycleEvent::Update,
        LifecycleEvent::Validate,
        LifecycleEvent::Delete,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleEvent::List => "list",
            LifecycleEvent::View => "view",
            LifecycleEvent::Create => "create",
            LifecycleEvent::Update => "update",
            LifecycleEvent::Validate => "validate",
            LifecycleEvent::Delete => "delete",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`LifecycleEvent::from_str`] for names outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown lifecycle event {0:?}")]
pub struct UnknownEvent(pub String);

impl FromStr for LifecycleEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleEvent::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// What a listener decided in chained mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Hand control to the next listener (or the terminal step).
    Continue,
    /// End the request now with this status and body.
    Respond { status: u16, body: Value },
}

impl Outcome {
    #[must_use]
    pub fn respond(status: u16, body: Value) -> Self {
        Outcome::Respond { status, body }
    }

    /// Short-circuit with status 200.
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Outcome::Respond { status: 200, body }
    }

    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Outcome::Continue)
    }
}

/// Arguments handed to a listener.
///
/// `request` is `None` when the event was raised with [`EventDispatcher::notify`].
#[derive(Debug, Clone, Copy)]
pub struct EventArgs<'a> {
    pub event: LifecycleEvent,
    pub request: Option<&'a RequestContext>,
    pub value: &'a Value,
}

/// Shared listener handle.
pub type Listener = Arc<dyn Fn(&EventArgs<'_>) -> Outcome + Send + Sync>;

/// Usage violations detected while dispatching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("response {first_status} already sent; second response {attempted_status} rejected")]
    AlreadyResponded {
        first_status: u16,
        attempted_status: u16,
    },
}

/// How a chained walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Every listener continued; the terminal step should run.
    Completed,
    /// The listener at `index` responded; nothing else may run.
    ShortCircuited { index: usize, status: u16 },
}

/// Ordered listener lists, one per lifecycle event.
///
/// Insertion order is invocation order. Entries are never reordered or deduplicated.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: HashMap<LifecycleEvent, Vec<Listener>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: LifecycleEvent, listener: Listener) {
        self.listeners.entry(event).or_default().push(listener);
    }

    #[must_use]
    pub fn get(&self, event: LifecycleEvent) -> &[Listener] {
        self.listeners.get(&event).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn len(&self, event: LifecycleEvent) -> usize {
        self.get(event).len()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for event in LifecycleEvent::ALL {
            map.entry(&event.as_str(), &self.len(event));
        }
        map.finish()
    }
}

/// Position of one chained walk over an event's listener list.
///
/// Created per [`EventDispatcher::trigger`] call and dropped when it returns.
pub struct DispatchCursor<'r> {
    listeners: &'r [Listener],
    index: usize,
}

impl<'r> DispatchCursor<'r> {
    #[must_use]
    pub fn new(listeners: &'r [Listener]) -> Self {
        Self {
            listeners,
            index: 0,
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Invoke the listener under the cursor and advance. `None` once exhausted.
    pub fn step(&mut self, args: &EventArgs<'_>) -> Option<(usize, Outcome)> {
        let listener = self.listeners.get(self.index)?;
        let position = self.index;
        self.index += 1;
        Some((position, listener(args)))
    }
}

/// Per-resource listener registry plus the invocation protocol.
///
/// Listeners are added while the owning controller is still exclusively borrowed
/// (at startup); afterwards the dispatcher is only read.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    resource: String,
    registry: ListenerRegistry,
}

impl EventDispatcher {
    #[must_use]
    pub fn new(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            registry: ListenerRegistry::new(),
        }
    }

    /// Append a listener to `event`'s chain.
    pub fn add_listener<F>(&mut self, event: LifecycleEvent, listener: F)
    where
        F: Fn(&EventArgs<'_>) -> Outcome + Send + Sync + 'static,
    {
        self.registry.push(event, Arc::new(listener));
        debug!(
            resource = %self.resource,
            event = %event,
            position = self.registry.len(event) - 1,
            "Listener registered"
        );
    }

    /// Register by event name. Names outside the fixed set are accepted but never
    /// triggered; returns whether the listener was attached to a real event.
    pub fn add_listener_named<F>(&mut self, name: &str, listener: F) -> bool
    where
        F: Fn(&EventArgs<'_>) -> Outcome + Send + Sync + 'static,
    {
        match name.parse::<LifecycleEvent>() {
            Ok(event) => {
                self.add_listener(event, listener);
                true
            }
            Err(_) => {
                debug!(
                    resource = %self.resource,
                    event = %name,
                    "Listener for unrecognized event will never be triggered"
                );
                false
            }
        }
    }

    #[must_use]
    pub fn listener_count(&self, event: LifecycleEvent) -> usize {
        self.registry.len(event)
    }

    #[must_use]
    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    /// Fire-and-forget: run every listener in order with only the value.
    /// Outcomes are ignored and no terminal step exists.
    pub fn notify(&self, event: LifecycleEvent, value: &Value) {
        let listeners = self.registry.get(event);
        if listeners.is_empty() {
            return;
        }
        let args = EventArgs {
            event,
            request: None,
            value,
        };
        for listener in listeners {
            let _ignored = listener(&args);
        }
        debug!(
            resource = %self.resource,
            event = %event,
            listeners = listeners.len(),
            "Event notified"
        );
    }

    /// Walk `event`'s listeners one at a time until one responds or all continue.
    ///
    /// A responding listener's status and body are written to `sink`.
    pub fn run_chain(
        &self,
        event: LifecycleEvent,
        ctx: &RequestContext,
        value: &Value,
        sink: &mut ResponseSink,
    ) -> Result<ChainOutcome, DispatchError> {
        let listeners = self.registry.get(event);
        if listeners.is_empty() {
            return Ok(ChainOutcome::Completed);
        }

        let args = EventArgs {
            event,
            request: Some(ctx),
            value,
        };
        let mut cursor = DispatchCursor::new(listeners);
        while let Some((index, outcome)) = cursor.step(&args) {
            match outcome {
                Outcome::Continue => {
                    debug!(
                        request_id = %ctx.request_id,
                        resource = %self.resource,
                        event = %event,
                        listener = index,
                        "Listener continued"
                    );
                }
                Outcome::Respond { status, body } => {
                    info!(
                        request_id = %ctx.request_id,
                        resource = %self.resource,
                        event = %event,
                        listener = index,
                        status = status,
                        "Listener short-circuited request"
                    );
                    sink.send(status, body)?;
                    return Ok(ChainOutcome::ShortCircuited { index, status });
                }
            }
        }
        Ok(ChainOutcome::Completed)
    }

    /// Chained dispatch: run the listeners, then `terminal` exactly once if none
    /// short-circuited. With no listeners `terminal` runs immediately.
    pub fn trigger<E, F>(
        &self,
        event: LifecycleEvent,
        ctx: &RequestContext,
        value: &Value,
        sink: &mut ResponseSink,
        terminal: F,
    ) -> Result<(), E>
    where
        F: FnOnce(&mut ResponseSink) -> Result<(), E>,
        E: From<DispatchError>,
    {
        match self.run_chain(event, ctx, value, sink)? {
            ChainOutcome::Completed => terminal(sink),
            ChainOutcome::ShortCircuited { .. } => Ok(()),
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("resource", &self.resource)
            .field("registry", &self.registry)
            .finish()
    }
}
