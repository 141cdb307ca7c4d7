//! Material requisitions and their status lifecycle.

#[cfg(test)]
#[path = "requisition_test.rs"]
mod requisition_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::{Validate, ValidationError};

use super::{Resource, not_blank};

// =============================================================================
// STATUS
// =============================================================================

/// Lifecycle position of a requisition.
///
/// `pending → approvedByPM → approvedByHO → forwarded → issued → received`,
/// with `rejected` reachable from the approval steps. Rejected, issued, and
/// received are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequisitionStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "approvedByPM")]
    ApprovedByPm,
    #[serde(rename = "approvedByHO")]
    ApprovedByHo,
    #[serde(rename = "forwarded")]
    Forwarded,
    #[serde(rename = "rejected")]
    Rejected,
    #[serde(rename = "issued")]
    Issued,
    #[serde(rename = "received")]
    Received,
}

impl RequisitionStatus {
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::ApprovedByPm,
        Self::ApprovedByHo,
        Self::Forwarded,
        Self::Rejected,
        Self::Issued,
        Self::Received,
    ];

    /// Wire name as the server spells it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ApprovedByPm => "approvedByPM",
            Self::ApprovedByHo => "approvedByHO",
            Self::Forwarded => "forwarded",
            Self::Rejected => "rejected",
            Self::Issued => "issued",
            Self::Received => "received",
        }
    }

    /// Display label used in notifications and tables.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::ApprovedByPm => "Approved by PM",
            Self::ApprovedByHo => "Approved by HO",
            Self::Forwarded => "Forwarded",
            Self::Rejected => "Rejected",
            Self::Issued => "Issued",
            Self::Received => "Received",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Issued | Self::Received)
    }
}

impl fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown requisition status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for RequisitionStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownStatus(raw.to_owned()))
    }
}

// =============================================================================
// REQUISITION
// =============================================================================

/// One transition timestamp per lifecycle step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub pm_approved_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub ho_approved_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub forwarded_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub received_at: Option<OffsetDateTime>,
}

impl Timestamps {
    /// Record the moment a requisition entered `status`.
    pub fn stamp(&mut self, status: RequisitionStatus, at: OffsetDateTime) {
        let slot = match status {
            RequisitionStatus::Pending => &mut self.created_at,
            RequisitionStatus::ApprovedByPm => &mut self.pm_approved_at,
            RequisitionStatus::ApprovedByHo => &mut self.ho_approved_at,
            RequisitionStatus::Forwarded => &mut self.forwarded_at,
            RequisitionStatus::Rejected => &mut self.rejected_at,
            RequisitionStatus::Issued => &mut self.issued_at,
            RequisitionStatus::Received => &mut self.received_at,
        };
        *slot = Some(at);
    }

    #[must_use]
    pub fn at(&self, status: RequisitionStatus) -> Option<OffsetDateTime> {
        match status {
            RequisitionStatus::Pending => self.created_at,
            RequisitionStatus::ApprovedByPm => self.pm_approved_at,
            RequisitionStatus::ApprovedByHo => self.ho_approved_at,
            RequisitionStatus::Forwarded => self.forwarded_at,
            RequisitionStatus::Rejected => self.rejected_at,
            RequisitionStatus::Issued => self.issued_at,
            RequisitionStatus::Received => self.received_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item: String,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requisition {
    pub id: String,
    #[serde(default)]
    pub requisition_number: Option<String>,
    #[serde(default)]
    pub status: RequisitionStatus,
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Resource for Requisition {
    type Draft = RequisitionDraft;
    const COLLECTION: &'static str = "requisitions";
    const LABEL: &'static str = "Requisition";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.requester.as_str(), self.status.as_str(), self.status.label()];
        fields.extend(self.requisition_number.as_deref());
        fields
    }
}

// =============================================================================
// FORMS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDraft {
    pub item: String,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionDraft {
    #[validate(custom = "not_blank")]
    pub site: String,
    #[validate(custom = "not_blank")]
    pub requester: String,
    #[validate(
        length(min = 1, message = "Add at least one line item"),
        custom = "valid_line_items"
    )]
    pub line_items: Vec<LineItemDraft>,
}

fn valid_line_items(items: &[LineItemDraft]) -> Result<(), ValidationError> {
    for (index, line) in items.iter().enumerate() {
        let problem = if line.item.trim().is_empty() {
            Some("item is required")
        } else if !(line.quantity.is_finite() && line.quantity > 0.0) {
            Some("quantity must be greater than 0")
        } else {
            None
        };
        if let Some(problem) = problem {
            let mut err = ValidationError::new("line_item");
            err.message = Some(format!("Line {}: {problem}", index + 1).into());
            return Err(err);
        }
    }
    Ok(())
}

/// Body of the reject endpoints: `{ "rejectionReason": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectionForm {
    #[validate(custom = "reason_given")]
    pub rejection_reason: String,
}

fn reason_given(reason: &str) -> Result<(), ValidationError> {
    if reason.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Rejection reason is required".into());
        return Err(err);
    }
    Ok(())
}
