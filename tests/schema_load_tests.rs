mod common;

use common::temp_files::{ServiceRoot, SHELVES_YAML, WIDGETS_YAML};
use crudhook::schema::{load_from_directory, load_schema_file, PropertyKind};
use std::path::Path;

#[test]
fn test_recursive_sorted_load() {
    let root = ServiceRoot::new()
        .with_resource("widgets.yml", WIDGETS_YAML)
        .with_resource("retail/shelves.yaml", SHELVES_YAML)
        .with_resource("notes.txt", "not a schema");
    let schemas = load_from_directory(&root.path().join("resources")).unwrap();
    let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["shelves", "widgets"]);

    let shelves = &schemas[0];
    assert_eq!(shelves.collection_uri, "/stores/{store}/shelves");
    assert_eq!(shelves.key_params(), vec!["store", "code"]);
    assert_eq!(
        shelves.descriptor("store").map(|d| d.kind),
        Some(PropertyKind::Number)
    );
}

#[test]
fn test_non_collection_documents_skipped() {
    let root = ServiceRoot::new()
        .with_resource("widgets.yml", WIDGETS_YAML)
        .with_resource("settings.yml", "name: settings\ntype: singleton\n");
    let schemas = load_from_directory(&root.path().join("resources")).unwrap();
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0].name, "widgets");
}

#[test]
fn test_unknown_kind_fails_with_path() {
    let root = ServiceRoot::new().with_resource(
        "broken.yml",
        "name: broken\nresource:\n  properties:\n    id: { type: uuid }\n",
    );
    let err = load_from_directory(&root.path().join("resources")).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("broken.yml"));
    assert!(message.contains("invalid property id"));
}

const ORDERS_YAML: &str = r#"
name: orders
resource:
  uri: /orders/:ref
  properties:
    ref: { type: integer }
    total: { type: float }
"#;

#[test]
fn test_integer_alias_and_colon_params() {
    let root = ServiceRoot::new().with_resource("orders.yml", ORDERS_YAML);
    let schema = load_schema_file(&root.path().join("resources/orders.yml"))
        .unwrap()
        .unwrap();
    assert_eq!(schema.resource_uri, "/orders/{ref}");
    assert_eq!(schema.descriptor("ref").map(|d| d.kind), Some(PropertyKind::Number));
}

#[test]
fn test_missing_directory_is_empty() {
    let schemas = load_from_directory(Path::new("/nonexistent/crudhook/resources")).unwrap();
    assert!(schemas.is_empty());
}

#[test]
fn test_missing_file_is_error() {
    let err = load_schema_file(Path::new("/nonexistent/widgets.yml")).unwrap_err();
    assert!(err.to_string().contains("failed to read schema file"));
}
