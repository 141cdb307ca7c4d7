use super::*;
use crate::error::{ErrorCode, NO_RESPONSE_MESSAGE};
use crate::notify::Variant;
use crate::test_helpers::{MockTransport, Scripted, api_with};
use serde_json::json;

#[derive(Debug, serde::Deserialize, PartialEq)]
struct Named {
    id: String,
    name: String,
}

// =============================================================
// Payload decoding
// =============================================================

#[test]
fn decode_payload_accepts_bare_value() {
    let decoded: Named = decode_payload(json!({ "id": "s1", "name": "Quarry" })).unwrap();
    assert_eq!(decoded, Named { id: "s1".into(), name: "Quarry".into() });
}

#[test]
fn decode_payload_unwraps_data_envelope() {
    let decoded: Vec<Named> = decode_payload(json!({ "data": [{ "id": "s1", "name": "Quarry" }] })).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].name, "Quarry");
}

#[test]
fn decode_payload_reports_shape_mismatch() {
    let err = decode_payload::<Vec<Named>>(json!({ "items": [] })).unwrap_err();
    assert_eq!(err.error_code(), "E_DECODE");
}

#[test]
fn server_error_prefers_message_then_error_field() {
    let with_message = server_error(&ApiResponse { status: 400, body: json!({ "message": "Name taken" }) });
    assert_eq!(with_message.to_string(), "Name taken");

    let with_error = server_error(&ApiResponse { status: 403, body: json!({ "error": "Forbidden" }) });
    assert_eq!(with_error.to_string(), "Forbidden");

    let bare = server_error(&ApiResponse { status: 502, body: Value::Null });
    assert!(matches!(bare, ClientError::Server { status: 502, .. }));
    assert_eq!(bare.to_string(), "Request failed with status 502");
}

// =============================================================
// Error-to-notification mapping
// =============================================================

#[tokio::test]
async fn success_returns_body_without_notifications() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "/sites/s1", 200, json!({ "id": "s1", "name": "Quarry" }));
    let (api, notices) = api_with(&transport);

    let site: Named = api.get("/sites/s1").await.unwrap();
    assert_eq!(site.id, "s1");
    assert!(notices.drain().is_empty());
}

#[tokio::test]
async fn server_failure_shows_server_message_as_destructive() {
    let transport = MockTransport::new();
    transport.respond(Method::Post, "/sites", 422, json!({ "message": "Short name already used" }));
    let (api, notices) = api_with(&transport);

    let err = api.post::<_, Named>("/sites", &json!({ "name": "x" })).await.unwrap_err();
    assert!(matches!(err, ClientError::Server { status: 422, .. }));

    let shown = notices.drain();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].variant, Variant::Destructive);
    assert_eq!(shown[0].description, "Short name already used");
}

#[tokio::test]
async fn missing_response_shows_generic_message() {
    let transport = MockTransport::new();
    transport.on(Method::Get, "/units", Scripted::Unreachable);
    let (api, notices) = api_with(&transport);

    let err = api.get::<Vec<Named>>("/units").await.unwrap_err();
    assert!(matches!(err, ClientError::NoResponse(_)));
    assert!(err.retryable());

    let shown = notices.drain();
    assert_eq!(shown.len(), 1);
    assert!(shown[0].is_destructive());
    assert_eq!(shown[0].description, NO_RESPONSE_MESSAGE);
}

#[tokio::test]
async fn query_pairs_and_body_reach_the_transport() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "/dashboard/summary", 200, json!({}));
    transport.respond(Method::Post, "/requisitions/r1/forward", 200, Value::Null);
    let (api, _notices) = api_with(&transport);

    let query = vec![("siteId".to_owned(), "s1".to_owned())];
    let _: Value = api.get_with_query("/dashboard/summary", query.clone()).await.unwrap();
    api.post_ack("/requisitions/r1/forward", &json!({})).await.unwrap();

    let sent = transport.requests();
    assert_eq!(sent[0].query, query);
    assert_eq!(sent[1].method, Method::Post);
    assert_eq!(sent[1].body, Some(json!({})));
}

#[tokio::test]
async fn delete_ignores_empty_body() {
    let transport = MockTransport::new();
    transport.respond(Method::Delete, "/units/u1", 204, Value::Null);
    let (api, notices) = api_with(&transport);

    api.delete("/units/u1").await.unwrap();
    assert!(notices.drain().is_empty());
}

#[test]
fn decode_payload_prefers_envelope_for_defaulted_types() {
    let item: crate::model::Item =
        decode_payload(json!({ "data": { "id": "i1", "name": "Oil filter", "unit": "u1" } })).unwrap();
    assert_eq!(item.id, "i1");
    assert_eq!(item.unit.as_deref(), Some("u1"));
}
