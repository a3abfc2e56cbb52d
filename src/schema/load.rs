use super::types::{normalize_uri, PropertyDescriptor, SchemaModel};
use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Problems found while turning a schema document into a [`SchemaModel`].
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("resource {resource}: invalid property {property}: {source}")]
    Property {
        resource: String,
        property: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("resource {resource}: URI parameter {param} is not a declared property")]
    UndeclaredKeyParam { resource: String, param: String },

    #[error("resource {resource}: property {property} must be a mapping")]
    NotAMapping { resource: String, property: String },
}

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    name: String,
    #[serde(rename = "type", default = "default_doc_type")]
    doc_type: String,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default, alias = "dbCollection")]
    table: Option<String>,
    #[serde(default)]
    resource: ResourceDocument,
}

#[derive(Debug, Default, Deserialize)]
struct ResourceDocument {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    properties: Map<String, Value>,
}

fn default_doc_type() -> String {
    "collection".to_string()
}

/// Parse one YAML schema document.
///
/// Returns `Ok(None)` for documents whose `type` is not `collection`; only
/// collections are exposed over HTTP.
pub fn parse_schema(yaml: &str) -> Result<Option<SchemaModel>, SchemaError> {
    let doc: SchemaDocument = serde_yaml::from_str(yaml)?;
    if doc.doc_type != "collection" {
        debug!(name = %doc.name, doc_type = %doc.doc_type, "Skipping non-collection schema");
        return Ok(None);
    }

    let collection_uri = doc
        .uri
        .as_deref()
        .map(normalize_uri)
        .unwrap_or_else(|| format!("/{}", doc.name));

    let mut schema =
        SchemaModel::new(&doc.name).with_table(doc.table.as_deref().unwrap_or(&doc.name));

    for (name, raw) in doc.resource.properties {
        if !raw.is_object() {
            return Err(SchemaError::NotAMapping {
                resource: doc.name.clone(),
                property: name,
            });
        }
        let descriptor: PropertyDescriptor =
            serde_json::from_value(raw).map_err(|source| SchemaError::Property {
                resource: doc.name.clone(),
                property: name.clone(),
                source,
            })?;
        schema.insert_property(&name, descriptor);
    }

    let resource_uri = match doc.resource.uri.as_deref() {
        Some(uri) => normalize_uri(uri),
        None => {
            let key = schema.id_property().unwrap_or("id");
            format!("{collection_uri}/{{{key}}}")
        }
    };
    schema = schema.with_uris(&collection_uri, &resource_uri);

    if let Some(param) = schema
        .key_params()
        .into_iter()
        .find(|param| schema.descriptor(param).is_none())
    {
        return Err(SchemaError::UndeclaredKeyParam {
            resource: schema.name.clone(),
            param: param.to_string(),
        });
    }

    Ok(Some(schema))
}

/// Load a single schema file.
pub fn load_schema_file(path: &Path) -> anyhow::Result<Option<SchemaModel>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {}", path.display()))?;
    parse_schema(&content).with_context(|| format!("failed to load schema {}", path.display()))
}

/// Load every `*.yml` / `*.yaml` schema below `dir`, recursing into subdirectories.
///
/// Files are visited in sorted path order so the resulting route table is stable.
/// A missing directory yields an empty list.
pub fn load_from_directory(dir: &Path) -> anyhow::Result<Vec<SchemaModel>> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "Resource directory not found - no schemas loaded");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    collect_schema_files(dir, &mut files)?;
    files.sort();

    let mut schemas: Vec<SchemaModel> = Vec::with_capacity(files.len());
    for file in files {
        if let Some(schema) = load_schema_file(&file)? {
            if schemas.iter().any(|s| s.name == schema.name) {
                anyhow::bail!(
                    "duplicate resource name {} in {}",
                    schema.name,
                    file.display()
                );
            }
            info!(
                resource = %schema.name,
                collection_uri = %schema.collection_uri,
                resource_uri = %schema.resource_uri,
                properties = schema.properties().len(),
                "Schema loaded"
            );
            schemas.push(schema);
        }
    }
    Ok(schemas)
}

fn collect_schema_files(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read resource directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_schema_files(&path, out)?;
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml") | Some("yaml")
        ) {
            out.push(path);
        }
    }
    Ok(())
}
