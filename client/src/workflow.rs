//! Requisition status workflow controller.
//!
//! DESIGN
//! ======
//! Each action is exactly one `POST /requisitions/:id/<action>`. Only after
//! the server confirms does the controller overwrite the local status and
//! stamp the matching transition timestamp, so a failed call needs no
//! rollback.
//!
//! Which actions are legal from which status is the caller's business; the
//! controller does not gate transitions. Rejections carry a reason that is
//! validated locally before anything is sent.
//!
//! ERROR HANDLING
//! ==============
//! No retries. Transport and server failures are notified by the gateway
//! and returned unchanged; the requisition is left exactly as it was.

#[cfg(test)]
#[path = "workflow_test.rs"]
mod workflow_test;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use time::OffsetDateTime;
use tracing::info;
use validator::Validate;

use crate::context::AppContext;
use crate::error::ClientError;
use crate::model::{RejectionForm, Requisition, RequisitionStatus};
use crate::net::api::post_requisition_action;
use crate::notify::Notification;
use crate::state::ResourceStore;

// =============================================================================
// ACTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequisitionAction {
    PmApprove,
    HoApprove,
    SiteReject { reason: String },
    HoReject { reason: String },
    Forward,
    /// Dispatch the material to the site.
    Issue,
    Receive,
}

impl RequisitionAction {
    pub const NAMES: [&'static str; 7] =
        ["pm-approve", "ho-approve", "site-reject", "ho-reject", "forward", "issue", "receive"];

    /// Endpoint segment under `/requisitions/:id/`.
    #[must_use]
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::PmApprove => "pm-approve",
            Self::HoApprove => "ho-approve",
            Self::SiteReject { .. } => "site-reject",
            Self::HoReject { .. } => "ho-reject",
            Self::Forward => "forward",
            Self::Issue => "issue",
            Self::Receive => "receive",
        }
    }

    /// Status the requisition holds once the server confirms this action.
    #[must_use]
    pub fn target_status(&self) -> RequisitionStatus {
        match self {
            Self::PmApprove => RequisitionStatus::ApprovedByPm,
            Self::HoApprove => RequisitionStatus::ApprovedByHo,
            Self::SiteReject { .. } | Self::HoReject { .. } => RequisitionStatus::Rejected,
            Self::Forward => RequisitionStatus::Forwarded,
            Self::Issue => RequisitionStatus::Issued,
            Self::Receive => RequisitionStatus::Received,
        }
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::SiteReject { reason } | Self::HoReject { reason } => Some(reason),
            _ => None,
        }
    }

    /// Build an action from its endpoint name. `dispatch` is accepted as an
    /// alias for `issue`, `approve` for `pm-approve`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownAction`] for names outside [`Self::NAMES`].
    pub fn from_name(name: &str, reason: Option<String>) -> Result<Self, UnknownAction> {
        let reason = reason.unwrap_or_default();
        match name.trim().to_ascii_lowercase().as_str() {
            "pm-approve" | "approve" => Ok(Self::PmApprove),
            "ho-approve" => Ok(Self::HoApprove),
            "site-reject" | "reject" => Ok(Self::SiteReject { reason }),
            "ho-reject" => Ok(Self::HoReject { reason }),
            "forward" => Ok(Self::Forward),
            "issue" | "dispatch" => Ok(Self::Issue),
            "receive" => Ok(Self::Receive),
            _ => Err(UnknownAction(name.to_owned())),
        }
    }

    fn body(&self) -> Result<Value, ClientError> {
        let Some(reason) = self.reason() else {
            return Ok(Value::Object(serde_json::Map::new()));
        };
        let form = RejectionForm { rejection_reason: reason.trim().to_owned() };
        form.validate()?;
        serde_json::to_value(&form).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl fmt::Display for RequisitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown requisition action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for RequisitionAction {
    type Err = UnknownAction;

    /// Parses reason-free actions; rejections parsed this way carry an empty
    /// reason and will fail validation until one is supplied.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::from_name(raw, None)
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct WorkflowController {
    ctx: AppContext,
}

impl WorkflowController {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Run `action` against `requisition` and apply it locally on success.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] for a blank rejection reason (no
    /// request is sent), otherwise the gateway error. `requisition` is not
    /// modified on any error.
    pub async fn apply(
        &self,
        requisition: &mut Requisition,
        action: &RequisitionAction,
    ) -> Result<RequisitionStatus, ClientError> {
        let body = action.body()?;
        post_requisition_action(&self.ctx.api, &requisition.id, action.endpoint(), &body).await?;

        let status = action.target_status();
        requisition.status = status;
        requisition.timestamps.stamp(status, OffsetDateTime::now_utc());
        if let Some(reason) = action.reason() {
            requisition.rejection_reason = Some(reason.trim().to_owned());
        }

        info!(id = %requisition.id, action = action.endpoint(), status = status.as_str(), "requisition transitioned");
        self.ctx.api.notify(Notification::success(
            "Success",
            format!("Requisition {}", status.label().to_lowercase()),
        ));
        Ok(status)
    }

    /// Look `id` up in `store` and apply `action` to it in place.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] when `id` is not cached (no request
    /// is sent), otherwise as [`Self::apply`].
    pub async fn apply_in_store(
        &self,
        store: &mut ResourceStore<Requisition>,
        id: &str,
        action: &RequisitionAction,
    ) -> Result<RequisitionStatus, ClientError> {
        let requisition = store
            .get_mut(id)
            .ok_or_else(|| ClientError::NotFound { kind: "Requisition", id: id.to_owned() })?;
        self.apply(requisition, action).await
    }

    /// Reject with `reason`, choosing the site or head-office endpoint.
    ///
    /// # Errors
    ///
    /// As [`Self::apply`].
    pub async fn reject(
        &self,
        requisition: &mut Requisition,
        reason: &str,
        head_office: bool,
    ) -> Result<RequisitionStatus, ClientError> {
        let action = if head_office {
            RequisitionAction::HoReject { reason: reason.to_owned() }
        } else {
            RequisitionAction::SiteReject { reason: reason.to_owned() }
        };
        self.apply(requisition, &action).await
    }
}
