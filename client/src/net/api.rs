//! Typed REST endpoints that do not belong to a generic collection flow.
//!
//! Collection CRUD goes through `state::store` and `forms`; what remains here
//! are the one-off reads and writes with their own paths.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use crate::error::ClientError;
use crate::model::{Resource, ScheduledMaintenance, Site};
use crate::net::encode_segment;
use crate::net::gateway::ApiClient;

/// The server spells this path segment `maintanance`.
const MAINTENANCE_SEGMENT: &str = "maintanance";

fn scheduled_maintenance_endpoint(machine_id: &str) -> String {
    format!("/{MAINTENANCE_SEGMENT}/scheduled/machine/{}", encode_segment(machine_id))
}

fn requisition_action_endpoint(requisition_id: &str, action: &str) -> String {
    format!("/requisitions/{}/{action}", encode_segment(requisition_id))
}

/// Fetch one site from `GET /sites/:id`.
///
/// # Errors
///
/// Returns the gateway error on failure.
pub async fn fetch_site(api: &ApiClient, site_id: &str) -> Result<Site, ClientError> {
    api.get(&Site::item_path(site_id)).await
}

/// Fetch scheduled maintenance for a machine.
///
/// # Errors
///
/// Returns the gateway error on failure.
pub async fn fetch_scheduled_maintenance(
    api: &ApiClient,
    machine_id: &str,
) -> Result<Vec<ScheduledMaintenance>, ClientError> {
    api.get(&scheduled_maintenance_endpoint(machine_id)).await
}

/// POST to a requisition status endpoint, discarding the response body.
///
/// # Errors
///
/// Returns the gateway error on failure.
pub async fn post_requisition_action<B: serde::Serialize + ?Sized>(
    api: &ApiClient,
    requisition_id: &str,
    action: &str,
    body: &B,
) -> Result<(), ClientError> {
    api.post_ack(&requisition_action_endpoint(requisition_id, action), body)
        .await
}
