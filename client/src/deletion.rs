//! Usage-guarded deletes for parent records (units, item groups).
//!
//! DESIGN
//! ======
//! Before sending `DELETE`, the cached item store is checked for records
//! that still reference the parent. A referenced parent is never sent to
//! the server. The server has the final word though: a `409` on the
//! `DELETE` itself is reported as a rejected outcome, and the local store
//! is only changed after a confirmed delete.

#[cfg(test)]
#[path = "deletion_test.rs"]
mod deletion_test;

use tracing::{info, warn};

use crate::error::ClientError;
use crate::model::{Item, ItemGroup, Resource, Unit};
use crate::net::gateway::ApiClient;
use crate::notify::Notification;
use crate::state::ResourceStore;

/// A parent record that items can reference.
pub trait UsageGuard: Resource {
    /// How many `items` reference the record with `id`.
    fn usage_count(id: &str, items: &[Item]) -> usize;
}

impl UsageGuard for Unit {
    fn usage_count(id: &str, items: &[Item]) -> usize {
        items.iter().filter(|item| item.unit.as_deref() == Some(id)).count()
    }
}

impl UsageGuard for ItemGroup {
    fn usage_count(id: &str, items: &[Item]) -> usize {
        items.iter().filter(|item| item.item_group.as_deref() == Some(id)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Deleted on the server, removed locally, and the store refetched.
    Deleted,
    /// Blocked locally because items still reference the record.
    InUse { count: usize },
    /// The server refused the delete.
    Rejected { message: String },
}

/// Delete `id` from `store` unless any of `items` still references it.
///
/// # Errors
///
/// Returns [`ClientError::NotFound`] when `id` is not in the store, and the
/// gateway error for failures other than a `409` conflict.
pub async fn confirm_delete<T: UsageGuard>(
    api: &ApiClient,
    store: &mut ResourceStore<T>,
    items: &[Item],
    id: &str,
) -> Result<DeleteOutcome, ClientError> {
    if store.get(id).is_none() {
        return Err(ClientError::NotFound { kind: T::LABEL, id: id.to_owned() });
    }

    let count = T::usage_count(id, items);
    if count > 0 {
        info!(collection = T::COLLECTION, %id, count, "delete blocked by references");
        api.notify(Notification::destructive(
            "Cannot Delete",
            format!("This {} is used by {count} item(s).", T::LABEL.to_lowercase()),
        ));
        return Ok(DeleteOutcome::InUse { count });
    }

    match api.delete(&T::item_path(id)).await {
        Ok(()) => {}
        Err(ClientError::Server { status: 409, message }) => {
            return Ok(DeleteOutcome::Rejected { message });
        }
        Err(e) => return Err(e),
    }

    store.remove(id);
    info!(collection = T::COLLECTION, %id, "record deleted");
    api.notify(Notification::success("Deleted", format!("{} deleted successfully", T::LABEL)));

    if let Err(e) = store.refresh(api).await {
        warn!(collection = T::COLLECTION, error = %e, "refresh after delete failed");
    }
    Ok(DeleteOutcome::Deleted)
}
