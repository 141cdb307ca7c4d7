//! Wire-level entity types shared by stores, forms, and controllers.
//!
//! DESIGN
//! ======
//! Field names follow the server's camelCase JSON. Every listable entity
//! implements [`Resource`], which names its collection path, its draft
//! type, and the fields the list search matches against.

pub mod requisition;
pub mod resources;


use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::net::encode_segment;

pub use requisition::{
    LineItem, LineItemDraft, RejectionForm, Requisition, RequisitionDraft, RequisitionStatus, Timestamps,
};
pub use resources::{
    Item, ItemDraft, ItemGroup, ItemGroupDraft, Machine, MachineDraft, ScheduledMaintenance, Site, SiteDraft, Unit,
    UnitDraft,
};

/// A server-owned entity collection.
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Form payload used to create or edit this entity.
    type Draft: Validate + Serialize + Send + Sync;

    /// Collection path segment under `/api`, e.g. `units`.
    const COLLECTION: &'static str;

    /// Human label for notifications, e.g. `Unit`.
    const LABEL: &'static str;

    fn id(&self) -> &str;

    /// Fields the list search matches (case-insensitive substring).
    fn search_fields(&self) -> Vec<&str>;

    #[must_use]
    fn collection_path() -> String {
        format!("/{}", Self::COLLECTION)
    }

    #[must_use]
    fn item_path(id: &str) -> String {
        format!("/{}/{}", Self::COLLECTION, encode_segment(id))
    }
}

/// Rejects empty and whitespace-only strings.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required".into());
        return Err(err);
    }
    Ok(())
}
