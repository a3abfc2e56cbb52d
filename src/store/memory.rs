use serde_json::{Map, Value};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::{json_type, Persistence, StoreError};
use crate::coerce::LookupKey;
use crate::schema::{PropertyKind, SchemaModel, StorageType};

struct Table {
    rows: Vec<Value>,
    next_id: i64,
}

/// In-process [`Persistence`] backend for one resource.
///
/// Records are JSON objects kept in insertion order. The schema's `id` property is
/// assigned from a per-table counter when a create omits it, and declared defaults
/// fill any other missing property.
pub struct MemoryStore {
    schema: SchemaModel,
    table: RwLock<Table>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(schema: &SchemaModel) -> Self {
        Self {
            schema: schema.clone(),
            table: RwLock::new(Table {
                rows: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Seed the table, e.g. from fixtures. Each record goes through `create`.
    pub fn with_records<I>(self, records: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = Value>,
    {
        for record in records {
            self.create(&record)?;
        }
        Ok(self)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.rows.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table>, StoreError> {
        self.table.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table>, StoreError> {
        self.table.write().map_err(|_| StoreError::Poisoned)
    }

    /// Fields that identify a record: the resource URI parameters, or the id property.
    fn identity_fields(&self) -> Vec<&str> {
        let params = self.schema.key_params();
        if !params.is_empty() {
            return params;
        }
        self.schema.id_property().into_iter().collect()
    }

    fn same_record(&self, a: &Value, b: &Value) -> bool {
        let fields = self.identity_fields();
        if fields.is_empty() {
            return a == b;
        }
        fields
            .iter()
            .all(|f| match (a.get(*f), b.get(*f)) {
                (Some(x), Some(y)) => json_eq(x, y),
                _ => false,
            })
    }

    fn object<'v>(&self, payload: &'v Value) -> Result<&'v Map<String, Value>, StoreError> {
        payload
            .as_object()
            .ok_or(StoreError::InvalidPayload(json_type(payload)))
    }

    /// Convert declared fields to their storage representation.
    fn normalize(&self, fields: &mut Map<String, Value>) {
        for property in self.schema.properties() {
            if let Some(value) = fields.get_mut(&property.name) {
                let converted = to_storage(property.descriptor.kind.storage_type(), value);
                if let Some(converted) = converted {
                    *value = converted;
                }
            }
        }
    }

    /// Fill in the id when the payload has none. Returns the counter value to
    /// commit once the row is accepted; the table is not touched here.
    fn assign_id(
        &self,
        table: &Table,
        fields: &mut Map<String, Value>,
    ) -> Result<Option<i64>, StoreError> {
        let Some(id_name) = self.schema.id_property() else {
            return Ok(None);
        };
        let given = fields.get(id_name).and_then(Value::as_i64);
        let id = given.unwrap_or(table.next_id);
        let next = id.checked_add(1).ok_or_else(|| {
            StoreError::backend(format!("id space exhausted in {}", self.schema.table))
        })?;
        if given.is_none() {
            fields.insert(id_name.to_string(), Value::from(id));
        }
        Ok(Some(table.next_id.max(next)))
    }

    /// Append a new row. The row's identity must not already be stored.
    fn insert_row(
        &self,
        table: &mut Table,
        mut fields: Map<String, Value>,
    ) -> Result<Value, StoreError> {
        let next_id = self.assign_id(table, &mut fields)?;
        let record = Value::Object(fields);
        if !self.identity_fields().is_empty()
            && table.rows.iter().any(|row| self.same_record(row, &record))
        {
            return Err(StoreError::Duplicate(self.schema.table.clone()));
        }
        if let Some(next_id) = next_id {
            table.next_id = next_id;
        }
        table.rows.push(record.clone());
        Ok(record)
    }

    fn apply_defaults(&self, fields: &mut Map<String, Value>) {
        for property in self.schema.properties() {
            if property.descriptor.kind == PropertyKind::Id {
                continue;
            }
            if let Some(default) = &property.descriptor.default {
                fields
                    .entry(property.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }
}

impl Persistence for MemoryStore {
    fn list(&self, limit: usize) -> Result<Vec<Value>, StoreError> {
        let table = self.read()?;
        Ok(table.rows.iter().take(limit).cloned().collect())
    }

    fn find_one(&self, key: &LookupKey) -> Result<Option<Value>, StoreError> {
        let table = self.read()?;
        Ok(table.rows.iter().find(|row| key.matches(row)).cloned())
    }

    fn create(&self, payload: &Value) -> Result<Value, StoreError> {
        let mut fields = self.object(payload)?.clone();
        self.normalize(&mut fields);
        self.apply_defaults(&mut fields);
        let mut table = self.write()?;
        let record = self.insert_row(&mut table, fields)?;
        debug!(table = %self.schema.table, rows = table.rows.len(), "Record created");
        Ok(record)
    }

    fn upsert(&self, payload: &Value) -> Result<Value, StoreError> {
        let mut fields = self.object(payload)?.clone();
        self.normalize(&mut fields);
        let candidate = Value::Object(fields.clone());
        let mut table = self.write()?;
        if let Some(slot) = table
            .rows
            .iter_mut()
            .find(|row| self.same_record(row, &candidate))
        {
            *slot = candidate.clone();
            debug!(table = %self.schema.table, "Record replaced");
            return Ok(candidate);
        }
        self.apply_defaults(&mut fields);
        let record = self.insert_row(&mut table, fields)?;
        debug!(table = %self.schema.table, "Record inserted by upsert");
        Ok(record)
    }

    fn apply_partial(&self, record: &Value, payload: &Value) -> Result<Value, StoreError> {
        let mut changes = self.object(payload)?.clone();
        self.normalize(&mut changes);
        let identity: Vec<String> = self
            .identity_fields()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut table = self.write()?;
        let slot = table
            .rows
            .iter_mut()
            .find(|row| self.same_record(row, record))
            .ok_or_else(|| StoreError::Missing(self.schema.table.clone()))?;
        if let Some(existing) = slot.as_object_mut() {
            for (name, value) in changes {
                if !identity.contains(&name) {
                    existing.insert(name, value);
                }
            }
        }
        debug!(table = %self.schema.table, "Record updated");
        Ok(slot.clone())
    }

    fn remove(&self, record: &Value) -> Result<(), StoreError> {
        let mut table = self.write()?;
        let position = table
            .rows
            .iter()
            .position(|row| self.same_record(row, record))
            .ok_or_else(|| StoreError::Missing(self.schema.table.clone()))?;
        table.rows.remove(position);
        debug!(table = %self.schema.table, rows = table.rows.len(), "Record removed");
        Ok(())
    }
}

/// Numeric-aware JSON equality (`3` equals `3.0`).
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

/// Storage form of a payload value, or `None` to keep it unchanged.
fn to_storage(storage: StorageType, value: &Value) -> Option<Value> {
    match (storage, value) {
        (StorageType::Number, Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Value::from)
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                })
        }
        (StorageType::Boolean, Value::String(s)) => match s.as_str() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        (StorageType::String | StorageType::Text | StorageType::Date, Value::Number(n)) => {
            Some(Value::String(n.to_string()))
        }
        _ => None,
    }
}
