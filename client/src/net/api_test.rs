use super::*;
use crate::net::transport::Method;
use crate::test_helpers::{MockTransport, api_with};
use serde_json::json;

#[test]
fn maintenance_endpoint_keeps_server_spelling() {
    assert_eq!(scheduled_maintenance_endpoint("m7"), "/maintanance/scheduled/machine/m7");
}

#[test]
fn action_endpoint_nests_under_requisition() {
    assert_eq!(requisition_action_endpoint("r1", "ho-approve"), "/requisitions/r1/ho-approve");
}

#[test]
fn ids_are_encoded_as_single_segments() {
    assert_eq!(scheduled_maintenance_endpoint("m/7?x#y"), "/maintanance/scheduled/machine/m%2F7%3Fx%23y");
    assert_eq!(requisition_action_endpoint("r 1", "receive"), "/requisitions/r%201/receive");
}

#[tokio::test]
async fn fetch_scheduled_maintenance_decodes_entries() {
    let transport = MockTransport::new();
    transport.respond(
        Method::Get,
        "/maintanance/scheduled/machine/m7",
        200,
        json!({ "data": [{ "id": "mt1", "machine": "m7", "maintenanceType": "Oil change", "scheduledDate": "2024-06-01" }] }),
    );
    let (api, _notices) = api_with(&transport);

    let entries = fetch_scheduled_maintenance(&api, "m7").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].maintenance_type, "Oil change");
}

#[tokio::test]
async fn fetch_site_reads_single_site() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "/sites/s1", 200, json!({ "id": "s1", "name": "North Pit", "shortName": "NP" }));
    let (api, _notices) = api_with(&transport);

    let site = fetch_site(&api, "s1").await.unwrap();
    assert_eq!(site.short_name, "NP");
}
