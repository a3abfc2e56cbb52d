mod common;

use common::temp_files::{ServiceRoot, SHELVES_YAML, WIDGETS_YAML};
use common::test_server::{send, send_raw, parse_response, start};
use crudhook::{App, LifecycleEvent, Outcome};
use serde_json::json;

fn widgets_app() -> (ServiceRoot, App) {
    let root = ServiceRoot::new()
        .with_resource("widgets.yml", WIDGETS_YAML)
        .with_resource("stores/shelves.yml", SHELVES_YAML);
    let app = App::from_root(root.path()).unwrap();
    (root, app)
}

#[test]
fn test_health_endpoint() {
    let (_root, app) = widgets_app();
    let server = start(app.into_service());
    let resp = send(server.addr(), "GET", "/health", None);
    server.stop();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!({"status": "ok"}));
}

#[test]
fn test_powered_by_header_on_every_response() {
    let (_root, app) = widgets_app();
    let server = start(app.into_service());
    let ok = send(server.addr(), "GET", "/widgets", None);
    let missing = send(server.addr(), "GET", "/nowhere", None);
    server.stop();
    assert_eq!(ok.header("X-Powered-By"), Some("crudhook"));
    assert_eq!(missing.header("X-Powered-By"), Some("crudhook"));
    assert!(ok
        .header("Content-Type")
        .is_some_and(|v| v.starts_with("application/json")));
}

#[test]
fn test_crud_round_trip() {
    let (_root, app) = widgets_app();
    let server = start(app.into_service());
    let addr = server.addr();

    let created = send(addr, "POST", "/widgets", Some(r#"{"name":"bolt","price":"2.5"}"#));
    let listed = send(addr, "GET", "/widgets", None);
    let viewed = send(addr, "GET", "/widgets/1", None);
    let patched = send(addr, "PATCH", "/widgets/1", Some(r#"{"price":3}"#));
    let replaced = send(addr, "PUT", "/widgets/1", Some(r#"{"name":"nut"}"#));
    let deleted = send(addr, "DELETE", "/widgets/1", None);
    let gone = send(addr, "GET", "/widgets/1", None);
    server.stop();

    assert_eq!(created.status, 200);
    assert_eq!(created.body, json!({"name": "bolt", "price": 2.5, "id": 1}));
    assert_eq!(listed.body, json!([{"name": "bolt", "price": 2.5, "id": 1}]));
    assert_eq!(viewed.status, 200);
    assert_eq!(viewed.body["name"], "bolt");
    assert_eq!(patched.body["price"], json!(3));
    assert_eq!(patched.body["name"], "bolt");
    assert_eq!(replaced.body, json!({"name": "nut", "id": 1}));
    assert_eq!(deleted.status, 200);
    assert_eq!(deleted.body, json!({"name": "nut", "id": 1}));
    assert_eq!(gone.status, 404);
    assert_eq!(gone.body["error"], "notfound");
}

#[test]
fn test_compound_key_resource() {
    let (_root, app) = widgets_app();
    let server = start(app.into_service());
    let addr = server.addr();

    let created = send(
        addr,
        "POST",
        "/stores/4/shelves",
        Some(r#"{"store":4,"code":"A1","label":"top"}"#),
    );
    let viewed = send(addr, "GET", "/stores/4/shelves/A1", None);
    let wrong_store = send(addr, "GET", "/stores/5/shelves/A1", None);
    server.stop();

    assert_eq!(created.status, 200);
    assert_eq!(viewed.status, 200);
    assert_eq!(viewed.body["label"], "top");
    assert_eq!(wrong_store.status, 404);
}

#[test]
fn test_unmatched_route_is_404() {
    let (_root, app) = widgets_app();
    let server = start(app.into_service());
    let resp = send(server.addr(), "POST", "/widgets/1", Some("{}"));
    server.stop();
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body["error"], "notfound");
    assert_eq!(resp.body["message"], "No route for POST /widgets/1");
}

#[test]
fn test_non_numeric_id_is_404() {
    let (_root, app) = widgets_app();
    let server = start(app.into_service());
    send(server.addr(), "POST", "/widgets", Some(r#"{"name":"bolt"}"#));
    let resp = send(server.addr(), "GET", "/widgets/abc", None);
    server.stop();
    assert_eq!(resp.status, 404);
}

#[test]
fn test_invalid_json_body_is_400() {
    let (_root, app) = widgets_app();
    let server = start(app.into_service());
    let resp = send(server.addr(), "POST", "/widgets", Some("{not json"));
    server.stop();
    assert_eq!(resp.status, 400);
    assert_eq!(resp.body["error"], "invalidbody");
}

#[test]
fn test_validate_listener_rejects_create() {
    let (_root, mut app) = widgets_app();
    app.collection_mut("widgets")
        .unwrap()
        .add_listener(LifecycleEvent::Validate, |args| {
            if args.value.get("name").is_some() {
                Outcome::Continue
            } else {
                Outcome::respond(400, json!({"error": "invalid", "field": "name"}))
            }
        });
    let server = start(app.into_service());
    let rejected = send(server.addr(), "POST", "/widgets", Some(r#"{"price":1}"#));
    let listed = send(server.addr(), "GET", "/widgets", None);
    server.stop();

    assert_eq!(rejected.status, 400);
    assert_eq!(rejected.body, json!({"error": "invalid", "field": "name"}));
    assert_eq!(listed.body, json!([]));
}

#[test]
fn test_listener_panic_is_500() {
    let (_root, mut app) = widgets_app();
    app.collection_mut("widgets")
        .unwrap()
        .add_listener(LifecycleEvent::List, |_| panic!("listener blew up"));
    let server = start(app.into_service());
    let first = send(server.addr(), "GET", "/widgets", None);
    let health = send(server.addr(), "GET", "/health", None);
    server.stop();

    assert_eq!(first.status, 500);
    assert_eq!(first.body["error"], "internal");
    assert_eq!(health.status, 200);
}

#[test]
fn test_query_string_ignored_for_routing() {
    let (_root, app) = widgets_app();
    let server = start(app.into_service());
    let raw = send_raw(
        server.addr(),
        "GET /widgets?limit=5&name=a%20b HTTP/1.1\r\nHost: localhost\r\n\r\n",
    );
    server.stop();
    let resp = parse_response(&raw);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!([]));
}
