use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::coerce::{LookupKey, ParameterCoercer};
use crate::context::{RequestContext, ResponseSink};
use crate::error::ResourceError;
use crate::events::{EventArgs, EventDispatcher, LifecycleEvent, Outcome};
use crate::schema::SchemaModel;
use crate::store::{Persistence, StoreError};

/// Default number of records returned by `list`.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// CRUD operations for one resource, each wrapped in lifecycle triggers.
///
/// Listener registration takes `&mut self` and must finish before the controller
/// is shared with the server.
pub struct ResourceController {
    schema: SchemaModel,
    store: Arc<dyn Persistence>,
    events: EventDispatcher,
    coercer: ParameterCoercer,
    list_limit: usize,
}

impl ResourceController {
    pub fn new(schema: SchemaModel, store: Arc<dyn Persistence>) -> Self {
        let events = EventDispatcher::new(&schema.name);
        Self {
            schema,
            store,
            events,
            coercer: ParameterCoercer::new(),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    #[must_use]
    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    #[must_use]
    pub fn with_coercer(mut self, coercer: ParameterCoercer) -> Self {
        self.coercer = coercer;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaModel {
        &self.schema
    }

    #[must_use]
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    #[must_use]
    pub fn list_limit(&self) -> usize {
        self.list_limit
    }

    pub fn add_listener<F>(&mut self, event: LifecycleEvent, listener: F)
    where
        F: Fn(&EventArgs<'_>) -> Outcome + Send + Sync + 'static,
    {
        self.events.add_listener(event, listener);
    }

    /// Register by event name; see [`EventDispatcher::add_listener_named`].
    pub fn add_listener_named<F>(&mut self, name: &str, listener: F) -> bool
    where
        F: Fn(&EventArgs<'_>) -> Outcome + Send + Sync + 'static,
    {
        self.events.add_listener_named(name, listener)
    }

    /// Raise `event` in fire-and-forget mode.
    pub fn notify(&self, event: LifecycleEvent, value: &Value) {
        self.events.notify(event, value);
    }

    /// Coerce the request's path parameters against the schema.
    pub fn coerce(&self, ctx: &RequestContext) -> Result<LookupKey, ResourceError> {
        self.coercer.coerce(
            &self.schema,
            ctx.path_params.iter().map(|(k, v)| (k.as_ref(), v.as_str())),
        )
    }

    /// Coerce the path parameters and load the addressed record into `ctx`.
    ///
    /// A miss is [`ResourceError::NotFound`]; nothing else runs for the request.
    pub fn resolve(&self, ctx: &mut RequestContext) -> Result<Value, ResourceError> {
        let key = self.coerce(ctx)?;
        let found = self
            .store
            .find_one(&key)
            .map_err(|e| self.persistence_failed(ctx, "find_one", e))?;
        ctx.key = Some(key);
        match found {
            Some(record) => {
                ctx.record = Some(record.clone());
                Ok(record)
            }
            None => {
                debug!(
                    request_id = %ctx.request_id,
                    resource = %self.schema.name,
                    key = ?ctx.key,
                    "Resource not found"
                );
                Err(ResourceError::NotFound)
            }
        }
    }

    pub fn list(
        &self,
        ctx: &mut RequestContext,
        sink: &mut ResponseSink,
    ) -> Result<(), ResourceError> {
        let items = self
            .store
            .list(self.list_limit)
            .map_err(|e| self.persistence_failed(ctx, "list", e))?;
        let items = Value::Array(items);
        self.events
            .trigger(LifecycleEvent::List, ctx, &items, sink, |sink| {
                sink.send_ok(items.clone()).map_err(ResourceError::from)
            })
    }

    pub fn view(
        &self,
        ctx: &mut RequestContext,
        sink: &mut ResponseSink,
    ) -> Result<(), ResourceError> {
        let record = self.resolve(ctx)?;
        self.events
            .trigger(LifecycleEvent::View, ctx, &record, sink, |sink| {
                sink.send_ok(record.clone()).map_err(ResourceError::from)
            })
    }

    pub fn create(
        &self,
        ctx: &mut RequestContext,
        sink: &mut ResponseSink,
    ) -> Result<(), ResourceError> {
        let payload = ctx.payload();
        if !self.validate(ctx, &payload, sink)? {
            return Ok(());
        }
        let created = self
            .store
            .create(&payload)
            .map_err(|e| self.persistence_failed(ctx, "create", e))?;
        ctx.record = Some(created.clone());
        self.events
            .trigger(LifecycleEvent::Create, ctx, &created, sink, |sink| {
                sink.send_ok(created.clone()).map_err(ResourceError::from)
            })
    }

    /// Full replacement: the stored record becomes the body plus the lookup key.
    pub fn replace(
        &self,
        ctx: &mut RequestContext,
        sink: &mut ResponseSink,
    ) -> Result<(), ResourceError> {
        self.resolve(ctx)?;
        let payload = ctx.payload();
        if !self.validate(ctx, &payload, sink)? {
            return Ok(());
        }
        let merged = merge_key(&payload, ctx.key.as_ref());
        let updated = self
            .store
            .upsert(&merged)
            .map_err(|e| self.persistence_failed(ctx, "upsert", e))?;
        self.finish_update(ctx, updated, sink)
    }

    /// Partial update: body fields are merged into the stored record.
    pub fn update(
        &self,
        ctx: &mut RequestContext,
        sink: &mut ResponseSink,
    ) -> Result<(), ResourceError> {
        let record = self.resolve(ctx)?;
        let payload = ctx.payload();
        if !self.validate(ctx, &payload, sink)? {
            return Ok(());
        }
        let updated = self
            .store
            .apply_partial(&record, &payload)
            .map_err(|e| self.persistence_failed(ctx, "apply_partial", e))?;
        self.finish_update(ctx, updated, sink)
    }

    /// Remove the record; the response carries the pre-removal snapshot.
    pub fn delete(
        &self,
        ctx: &mut RequestContext,
        sink: &mut ResponseSink,
    ) -> Result<(), ResourceError> {
        let snapshot = self.resolve(ctx)?;
        self.store
            .remove(&snapshot)
            .map_err(|e| self.persistence_failed(ctx, "remove", e))?;
        self.events
            .trigger(LifecycleEvent::Delete, ctx, &snapshot, sink, |sink| {
                sink.send_ok(snapshot.clone()).map_err(ResourceError::from)
            })
    }

    fn finish_update(
        &self,
        ctx: &mut RequestContext,
        updated: Value,
        sink: &mut ResponseSink,
    ) -> Result<(), ResourceError> {
        self.events
            .trigger(LifecycleEvent::Update, ctx, &updated, sink, |sink| {
                sink.send_ok(updated.clone()).map_err(ResourceError::from)
            })
    }

    /// Run the `validate` chain. Returns `false` when a listener responded.
    fn validate(
        &self,
        ctx: &RequestContext,
        payload: &Value,
        sink: &mut ResponseSink,
    ) -> Result<bool, ResourceError> {
        let mut passed = false;
        self.events
            .trigger(LifecycleEvent::Validate, ctx, payload, sink, |_| {
                passed = true;
                Ok::<(), ResourceError>(())
            })?;
        if !passed {
            warn!(
                request_id = %ctx.request_id,
                resource = %self.schema.name,
                "Request rejected by validate listener"
            );
        }
        Ok(passed)
    }

    fn persistence_failed(
        &self,
        ctx: &RequestContext,
        call: &str,
        err: StoreError,
    ) -> ResourceError {
        error!(
            request_id = %ctx.request_id,
            resource = %self.schema.name,
            call = call,
            error = %err,
            "Persistence call failed"
        );
        ResourceError::Persistence(err)
    }
}

impl fmt::Debug for ResourceController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceController")
            .field("resource", &self.schema.name)
            .field("list_limit", &self.list_limit)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Overlay the lookup key onto an object payload.
fn merge_key(payload: &Value, key: Option<&LookupKey>) -> Value {
    let mut fields = match payload {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    if let Some(key) = key {
        for (name, value) in key.iter() {
            fields.insert(name.to_string(), value.to_json());
        }
    }
    Value::Object(fields)
}
