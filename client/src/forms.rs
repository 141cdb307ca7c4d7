//! Entity form submission.
//!
//! DESIGN
//! ======
//! Validate the draft, send it (`POST` to create, `PUT` to edit), then
//! refetch the collection so the list reflects the server's view. Nothing
//! is written to the store before the server confirms.
//!
//! A 2xx status is the confirmation. The reply body is only a convenience:
//! when it decodes into the entity it is returned and upserted, otherwise
//! the save still stands and the refetch supplies the record.
//!
//! ERROR HANDLING
//! ==============
//! Validation failures return field errors and send nothing. A failed
//! refresh after a confirmed save is logged and notified by the gateway,
//! but the save itself still counts: the saved record is upserted locally.

#[cfg(test)]
#[path = "forms_test.rs"]
mod forms_test;

use tracing::{debug, info, warn};
use validator::Validate;

use crate::error::ClientError;
use crate::model::Resource;
use crate::net::gateway::{ApiClient, decode_payload};
use crate::net::transport::Method;
use crate::notify::Notification;
use crate::state::ResourceStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

/// Submit `draft` for `T` and refresh `store`, returning the saved record
/// when the reply carried one.
///
/// # Errors
///
/// Returns [`ClientError::Validation`] when the draft is invalid (no request
/// sent), otherwise the gateway error when the save fails. The store is
/// untouched on any error.
pub async fn submit<T: Resource>(
    api: &ApiClient,
    store: &mut ResourceStore<T>,
    mode: &FormMode,
    draft: &T::Draft,
) -> Result<Option<T>, ClientError> {
    draft.validate()?;

    let body = match mode {
        FormMode::Create => api.send_json(Method::Post, &T::collection_path(), draft).await?,
        FormMode::Edit(id) => api.send_json(Method::Put, &T::item_path(id), draft).await?,
    };
    let saved = match decode_payload::<T>(body) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(collection = T::COLLECTION, error = %e, "save reply carried no record");
            None
        }
    };
    info!(collection = T::COLLECTION, id = saved.as_ref().map_or("unknown", |r| r.id()), "record saved");

    let verb = match mode {
        FormMode::Create => "created",
        FormMode::Edit(_) => "updated",
    };
    api.notify(Notification::success("Success", format!("{} {verb} successfully", T::LABEL)));

    if let Some(record) = &saved {
        store.upsert(record.clone());
    }
    if let Err(e) = store.refresh(api).await {
        warn!(collection = T::COLLECTION, error = %e, "refresh after save failed");
    }
    Ok(saved)
}
