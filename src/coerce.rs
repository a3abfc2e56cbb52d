//! # Parameter Coercion
//!
//! Path parameters arrive as strings. Before a lookup they are converted into the
//! typed values their schema-declared kinds imply, producing a [`LookupKey`] that the
//! persistence layer matches by equality.
//!
//! | Kind | Coercion |
//! |------|----------|
//! | `id`, `number` | base-10 integer |
//! | `float` | floating point |
//! | everything else | raw string |
//!
//! Numeric parsing is lenient by default: a leading numeric prefix is accepted
//! (`"42abc"` → `42`) and input without one becomes [`LookupValue::NaN`], which is
//! passed through and never equals a stored value. With strict coercion enabled the
//! whole parameter must parse, otherwise [`ResourceError::InvalidParameter`] is returned.
//! A lenient integer whose digits overflow `i64` is kept as the nearest float rather
//! than becoming `NaN`.

use serde_json::Value;
use tracing::debug;

use crate::error::ResourceError;
use crate::schema::{PropertyKind, SchemaModel};

/// A typed lookup value produced from one path parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupValue {
    Integer(i64),
    Float(f64),
    Text(String),
    /// Not-a-number sentinel for a numeric parameter that did not parse.
    /// Carries the raw input for logging.
    NaN(String),
}

impl LookupValue {
    /// Equality against a stored JSON value. `NaN` matches nothing.
    #[must_use]
    pub fn matches(&self, stored: &Value) -> bool {
        match self {
            LookupValue::Integer(i) => match stored {
                Value::Number(n) => n
                    .as_i64()
                    .map(|v| v == *i)
                    .or_else(|| n.as_f64().map(|v| v == *i as f64))
                    .unwrap_or(false),
                _ => false,
            },
            LookupValue::Float(f) => stored.as_f64().is_some_and(|v| v == *f),
            LookupValue::Text(s) => stored.as_str() == Some(s.as_str()),
            LookupValue::NaN(_) => false,
        }
    }

    /// JSON rendering used when a lookup key is merged into a payload.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            LookupValue::Integer(i) => Value::from(*i),
            LookupValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            LookupValue::Text(s) => Value::String(s.clone()),
            LookupValue::NaN(_) => Value::Null,
        }
    }
}

/// Ordered property name → coerced value pairs, matched by equality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupKey {
    fields: Vec<(String, LookupValue)>,
}

impl LookupKey {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: LookupValue) {
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LookupValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LookupValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every field of the key equals the record's field of the same name.
    #[must_use]
    pub fn matches(&self, record: &Value) -> bool {
        self.fields.iter().all(|(name, value)| {
            record
                .get(name)
                .is_some_and(|stored| value.matches(stored))
        })
    }
}

impl FromIterator<(String, LookupValue)> for LookupKey {
    fn from_iter<T: IntoIterator<Item = (String, LookupValue)>>(iter: T) -> Self {
        let mut key = LookupKey::new();
        for (name, value) in iter {
            key.insert(&name, value);
        }
        key
    }
}

/// Converts raw path parameters into a [`LookupKey`] using a resource's schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterCoercer {
    strict_numbers: bool,
}

impl ParameterCoercer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject unparseable numeric parameters instead of passing `NaN` through.
    #[must_use]
    pub fn strict(strict_numbers: bool) -> Self {
        Self { strict_numbers }
    }

    /// Coerce every parameter. Fails on the first name the schema does not declare,
    /// before any persistence access takes place.
    pub fn coerce<'a, I>(&self, schema: &SchemaModel, params: I) -> Result<LookupKey, ResourceError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut key = LookupKey::new();
        for (name, raw) in params {
            let descriptor =
                schema
                    .descriptor(name)
                    .ok_or_else(|| ResourceError::UnknownProperty {
                        property: name.to_string(),
                        resource: schema.name.clone(),
                    })?;
            let value = self.coerce_value(name, raw, descriptor.kind)?;
            debug!(
                resource = %schema.name,
                property = %name,
                kind = %descriptor.kind,
                value = ?value,
                "Path parameter coerced"
            );
            key.insert(name, value);
        }
        Ok(key)
    }

    fn coerce_value(
        &self,
        name: &str,
        raw: &str,
        kind: PropertyKind,
    ) -> Result<LookupValue, ResourceError> {
        let value = match kind {
            PropertyKind::Id | PropertyKind::Number => {
                if self.strict_numbers {
                    raw.trim().parse::<i64>().ok().map(LookupValue::Integer)
                } else {
                    parse_int_prefix(raw)
                }
            }
            PropertyKind::Float => {
                let parsed = if self.strict_numbers {
                    raw.trim().parse::<f64>().ok().filter(|f| f.is_finite())
                } else {
                    parse_float_prefix(raw)
                };
                parsed.map(LookupValue::Float)
            }
            PropertyKind::String
            | PropertyKind::Text
            | PropertyKind::Date
            | PropertyKind::Boolean
            | PropertyKind::Email => Some(LookupValue::Text(raw.to_string())),
        };

        match value {
            Some(v) => Ok(v),
            None if self.strict_numbers => Err(ResourceError::InvalidParameter {
                property: name.to_string(),
                value: raw.to_string(),
            }),
            None => Ok(LookupValue::NaN(raw.to_string())),
        }
    }
}

/// Leading-prefix integer parse: optional whitespace and sign, then digits.
/// A digit run beyond the `i64` range is kept as its nearest `f64`.
fn parse_int_prefix(raw: &str) -> Option<LookupValue> {
    let s = raw.trim_start();
    let sign_len = usize::from(matches!(s.as_bytes().first(), Some(b'-' | b'+')));
    let digits = &s[sign_len..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let prefix = &s[..sign_len + end];
    match prefix.parse::<i64>() {
        Ok(n) => Some(LookupValue::Integer(n)),
        Err(_) => prefix
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(LookupValue::Float),
    }
}

/// Leading-prefix float parse: the longest numeric prefix that parses.
fn parse_float_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let candidate_len = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(s.len());
    (1..=candidate_len)
        .rev()
        .find_map(|len| s[..len].parse::<f64>().ok())
        .filter(|f| f.is_finite())
}
