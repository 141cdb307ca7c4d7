use super::*;
use serde_json::json;
use time::macros::datetime;

// =============================================================
// Status wire names
// =============================================================

#[test]
fn status_uses_server_spelling() {
    assert_eq!(serde_json::to_value(RequisitionStatus::ApprovedByPm).unwrap(), json!("approvedByPM"));
    assert_eq!(serde_json::to_value(RequisitionStatus::ApprovedByHo).unwrap(), json!("approvedByHO"));
    let parsed: RequisitionStatus = serde_json::from_value(json!("forwarded")).unwrap();
    assert_eq!(parsed, RequisitionStatus::Forwarded);
}

#[test]
fn status_from_str_is_case_insensitive() {
    assert_eq!("APPROVEDBYHO".parse::<RequisitionStatus>().unwrap(), RequisitionStatus::ApprovedByHo);
    assert_eq!(" issued ".parse::<RequisitionStatus>().unwrap(), RequisitionStatus::Issued);
    assert!("approved".parse::<RequisitionStatus>().is_err());
}

#[test]
fn terminal_statuses() {
    let terminal: Vec<_> = RequisitionStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
    assert_eq!(
        terminal,
        vec![RequisitionStatus::Rejected, RequisitionStatus::Issued, RequisitionStatus::Received]
    );
}

// =============================================================
// Requisition payloads
// =============================================================

#[test]
fn requisition_decodes_with_flattened_timestamps() {
    let raw = json!({
        "id": "r1",
        "requisitionNumber": "REQ-0001",
        "status": "approvedByPM",
        "requester": "A. Mensah",
        "site": "s1",
        "lineItems": [{ "item": "i1", "quantity": 2.5 }],
        "createdAt": "2024-03-01T08:00:00Z",
        "pmApprovedAt": "2024-03-02T09:30:00Z"
    });

    let req: Requisition = serde_json::from_value(raw).unwrap();
    assert_eq!(req.status, RequisitionStatus::ApprovedByPm);
    assert_eq!(req.line_items[0].quantity, 2.5);
    assert_eq!(req.timestamps.pm_approved_at, Some(datetime!(2024-03-02 09:30 UTC)));
    assert!(req.timestamps.ho_approved_at.is_none());
}

#[test]
fn stamp_sets_only_the_matching_slot() {
    let mut stamps = Timestamps::default();
    let at = datetime!(2024-05-10 12:00 UTC);
    stamps.stamp(RequisitionStatus::Issued, at);

    assert_eq!(stamps.at(RequisitionStatus::Issued), Some(at));
    for status in RequisitionStatus::ALL.into_iter().filter(|s| *s != RequisitionStatus::Issued) {
        assert!(stamps.at(status).is_none(), "{status:?} should be unset");
    }
}

// =============================================================
// Draft validation
// =============================================================

fn valid_draft() -> RequisitionDraft {
    RequisitionDraft {
        site: "s1".into(),
        requester: "A. Mensah".into(),
        line_items: vec![LineItemDraft { item: "i1".into(), quantity: 3.0, remarks: None }],
    }
}

#[test]
fn valid_draft_passes() {
    assert!(valid_draft().validate().is_ok());
}

#[test]
fn draft_without_lines_is_rejected() {
    let draft = RequisitionDraft { line_items: Vec::new(), ..valid_draft() };
    let errors = crate::error::FieldErrors::from(draft.validate().unwrap_err());
    assert_eq!(errors.get("lineItems"), Some("Add at least one line item"));
}

#[test]
fn draft_with_zero_quantity_names_the_line() {
    let mut draft = valid_draft();
    draft.line_items.push(LineItemDraft { item: "i2".into(), quantity: 0.0, remarks: None });
    let errors = crate::error::FieldErrors::from(draft.validate().unwrap_err());
    assert_eq!(errors.get("lineItems"), Some("Line 2: quantity must be greater than 0"));
}

#[test]
fn draft_with_blank_site_is_rejected() {
    let draft = RequisitionDraft { site: "  ".into(), ..valid_draft() };
    let errors = crate::error::FieldErrors::from(draft.validate().unwrap_err());
    assert!(errors.get("site").is_some());
}

#[test]
fn rejection_form_requires_visible_text() {
    for reason in ["", "   ", "\t\n"] {
        let form = RejectionForm { rejection_reason: reason.into() };
        assert!(form.validate().is_err(), "{reason:?} should be rejected");
    }
    let form = RejectionForm { rejection_reason: "Budget exceeded".into() };
    assert!(form.validate().is_ok());
    assert_eq!(serde_json::to_value(&form).unwrap(), json!({ "rejectionReason": "Budget exceeded" }));
}
