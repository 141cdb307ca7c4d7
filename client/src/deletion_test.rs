use super::*;
use crate::net::transport::Method;
use crate::notify::Variant;
use crate::test_helpers::{MockTransport, api_with};
use serde_json::json;

fn kilogram_store() -> ResourceStore<Unit> {
    ResourceStore::with_items(vec![Unit { id: "u1".into(), name: "Kilogram".into(), short_name: "Kg".into() }])
}

fn item_using(unit: &str) -> Item {
    serde_json::from_value(json!({ "unit": unit })).unwrap()
}

#[tokio::test]
async fn referenced_unit_cannot_be_deleted() {
    let transport = MockTransport::new();
    let (api, notices) = api_with(&transport);
    let mut units = kilogram_store();
    let before = units.items.clone();

    let outcome = confirm_delete(&api, &mut units, &[item_using("u1")], "u1").await.unwrap();

    assert_eq!(outcome, DeleteOutcome::InUse { count: 1 });
    assert_eq!(units.items, before);
    assert!(transport.requests().is_empty());

    let shown = notices.drain();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].variant, Variant::Destructive);
    assert_eq!(shown[0].title, "Cannot Delete");
}

#[tokio::test]
async fn unreferenced_unit_is_deleted_and_refetched() {
    let transport = MockTransport::new();
    transport.respond(Method::Delete, "/units/u1", 200, json!({ "message": "deleted" }));
    transport.respond(Method::Get, "/units", 200, json!([]));
    let (api, notices) = api_with(&transport);
    let mut units = kilogram_store();

    let outcome = confirm_delete(&api, &mut units, &[item_using("u2")], "u1").await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(units.get("u1").is_none());
    assert_eq!(transport.count(Method::Get, "/units"), 1);
    assert_eq!(notices.drain()[0].title, "Deleted");
}

#[tokio::test]
async fn server_conflict_is_authoritative() {
    let transport = MockTransport::new();
    transport.respond(Method::Delete, "/units/u1", 409, json!({ "message": "Unit is referenced by stock entries" }));
    let (api, notices) = api_with(&transport);
    let mut units = kilogram_store();

    let outcome = confirm_delete(&api, &mut units, &[], "u1").await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Rejected { message: "Unit is referenced by stock entries".into() });
    assert!(units.get("u1").is_some());
    assert!(notices.drain()[0].is_destructive());
}

#[tokio::test]
async fn other_server_errors_propagate_without_mutation() {
    let transport = MockTransport::new();
    transport.respond(Method::Delete, "/units/u1", 500, json!({ "message": "boom" }));
    let (api, _notices) = api_with(&transport);
    let mut units = kilogram_store();

    let err = confirm_delete(&api, &mut units, &[], "u1").await.unwrap_err();

    assert!(matches!(err, ClientError::Server { status: 500, .. }));
    assert_eq!(units.len(), 1);
}

#[tokio::test]
async fn unknown_id_is_not_sent() {
    let transport = MockTransport::new();
    let (api, _notices) = api_with(&transport);
    let mut units = kilogram_store();

    let err = confirm_delete(&api, &mut units, &[], "nope").await.unwrap_err();

    assert!(matches!(err, ClientError::NotFound { kind: "Unit", .. }));
    assert!(transport.requests().is_empty());
}

#[test]
fn item_group_usage_counts_group_references() {
    let items: Vec<Item> = vec![
        serde_json::from_value(json!({ "itemGroup": "g1" })).unwrap(),
        serde_json::from_value(json!({ "itemGroup": "g1", "unit": "u1" })).unwrap(),
        serde_json::from_value(json!({ "itemGroup": "g2" })).unwrap(),
    ];
    assert_eq!(ItemGroup::usage_count("g1", &items), 2);
    assert_eq!(Unit::usage_count("u1", &items), 1);
    assert_eq!(Unit::usage_count("u9", &items), 0);
}
