use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Declared kind of a resource property.
///
/// The set is closed: adding a kind means adding a variant here and handling it in
/// every exhaustive match ([`PropertyKind::is_numeric`], [`PropertyKind::storage_type`],
/// and the parameter coercer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Id,
    String,
    Text,
    Date,
    #[serde(alias = "int", alias = "integer")]
    Number,
    Float,
    Boolean,
    Email,
}

/// Column type a property is stored as by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Number,
    String,
    Text,
    Date,
    Boolean,
}

impl PropertyKind {
    #[must_use]
    pub fn is_numeric(self) -> bool {
        match self {
            PropertyKind::Id | PropertyKind::Number | PropertyKind::Float => true,
            PropertyKind::String
            | PropertyKind::Text
            | PropertyKind::Date
            | PropertyKind::Boolean
            | PropertyKind::Email => false,
        }
    }

    #[must_use]
    pub fn storage_type(self) -> StorageType {
        match self {
            PropertyKind::Id | PropertyKind::Number | PropertyKind::Float => StorageType::Number,
            PropertyKind::String | PropertyKind::Email => StorageType::String,
            PropertyKind::Text => StorageType::Text,
            PropertyKind::Date => StorageType::Date,
            PropertyKind::Boolean => StorageType::Boolean,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Id => "id",
            PropertyKind::String => "string",
            PropertyKind::Text => "text",
            PropertyKind::Date => "date",
            PropertyKind::Number => "number",
            PropertyKind::Float => "float",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Email => "email",
        }
    }
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of a single property inside a resource schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyDescriptor {
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    /// Maximum length; schema files may write it as a number or a numeric string.
    #[serde(default, deserialize_with = "deserialize_length")]
    pub length: Option<u32>,
    #[serde(default)]
    pub index: bool,
    #[serde(default)]
    pub default: Option<Value>,
}

impl PropertyDescriptor {
    #[must_use]
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            length: None,
            index: false,
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.index = true;
        self
    }
}

fn deserialize_length<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid length {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid length {s:?}"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid length {other}"
        ))),
    }
}

/// A named property, kept in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub descriptor: PropertyDescriptor,
}

/// Typed description of one resource: its name, the two URIs it is served on,
/// and its ordered property declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaModel {
    /// Unique resource name (e.g. `widgets`).
    pub name: String,
    /// Storage table/collection name.
    pub table: String,
    /// Collection URI (e.g. `/widgets`).
    pub collection_uri: String,
    /// Resource URI template (e.g. `/widgets/{id}`).
    pub resource_uri: String,
    properties: Vec<Property>,
}

impl SchemaModel {
    /// Build a schema with the conventional URIs `/<name>` and `/<name>/{id}`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let collection_uri = format!("/{name}");
        let resource_uri = format!("{collection_uri}/{{id}}");
        Self {
            name: name.to_string(),
            table: name.to_string(),
            collection_uri,
            resource_uri,
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_uris(mut self, collection_uri: &str, resource_uri: &str) -> Self {
        self.collection_uri = normalize_uri(collection_uri);
        self.resource_uri = normalize_uri(resource_uri);
        self
    }

    #[must_use]
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    /// Append a property. Redeclaring a name replaces the earlier descriptor in place.
    #[must_use]
    pub fn property(mut self, name: &str, descriptor: PropertyDescriptor) -> Self {
        self.insert_property(name, descriptor);
        self
    }

    pub(crate) fn insert_property(&mut self, name: &str, descriptor: PropertyDescriptor) {
        if let Some(existing) = self.properties.iter_mut().find(|p| p.name == name) {
            existing.descriptor = descriptor;
        } else {
            self.properties.push(Property {
                name: name.to_string(),
                descriptor,
            });
        }
    }

    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.descriptor)
    }

    /// Name of the first `id`-kind property, if any.
    #[must_use]
    pub fn id_property(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.descriptor.kind == PropertyKind::Id)
            .map(|p| p.name.as_str())
    }

    /// Parameter names appearing in the resource URI template, in order.
    #[must_use]
    pub fn key_params(&self) -> Vec<&str> {
        template_params(&self.resource_uri)
    }
}

/// Extract `{param}` names from a URI template.
#[must_use]
pub fn template_params(template: &str) -> Vec<&str> {
    template
        .split('/')
        .filter_map(|segment| {
            segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
        })
        .collect()
}

/// Rewrite `:param` segments into `{param}` form and ensure a leading slash.
#[must_use]
pub fn normalize_uri(uri: &str) -> String {
    let trimmed = uri.trim();
    let segments: Vec<String> = trimmed
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| match segment.strip_prefix(':') {
            Some(param) => format!("{{{param}}}"),
            None => segment.to_string(),
        })
        .collect();
    format!("/{}", segments.join("/"))
}
