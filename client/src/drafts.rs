//! Local draft storage for creates that could not reach the server.
//!
//! DESIGN
//! ======
//! Drafts are kept as one JSON array per key in `<dir>/<key>.json`. Every
//! write replaces the whole file. Keys are collection names, so a draft of
//! an item group lives in `item-groups.json`.
//!
//! Only an unreachable server produces a draft. Server rejections and local
//! validation failures are the user's to fix and are returned as errors.
//!
//! ERROR HANDLING
//! ==============
//! IO and JSON failures map to [`ClientError::Drafts`]. A missing file is
//! not an error; it reads as an empty list.

#[cfg(test)]
#[path = "drafts_test.rs"]
mod drafts_test;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::ClientError;
use crate::forms::{FormMode, submit};
use crate::model::Resource;
use crate::net::gateway::ApiClient;
use crate::notify::Notification;
use crate::state::ResourceStore;

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Drafts`] when the file exists but cannot be
    /// read or parsed.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, ClientError> {
        let path = self.path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(drafts_error(&path, &e)),
        };
        serde_json::from_str(&raw).map_err(|e| drafts_error(&path, &e))
    }

    /// Replace the drafts stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Drafts`] when the directory or file cannot be
    /// written.
    pub fn save<T: Serialize>(&self, key: &str, drafts: &[T]) -> Result<(), ClientError> {
        let path = self.path(key);
        fs::create_dir_all(&self.dir).map_err(|e| drafts_error(&self.dir, &e))?;
        let raw = serde_json::to_string_pretty(drafts).map_err(|e| drafts_error(&path, &e))?;
        fs::write(&path, raw).map_err(|e| drafts_error(&path, &e))
    }

    /// Append one draft under `key`, returning how many are now stored.
    ///
    /// # Errors
    ///
    /// As [`Self::load`] and [`Self::save`].
    pub fn push<T: Serialize + DeserializeOwned>(&self, key: &str, draft: T) -> Result<usize, ClientError> {
        let mut drafts: Vec<T> = self.load(key)?;
        drafts.push(draft);
        self.save(key, &drafts)?;
        Ok(drafts.len())
    }

    /// Remove every draft under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Drafts`] when an existing file cannot be
    /// removed.
    pub fn clear(&self, key: &str) -> Result<(), ClientError> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(drafts_error(&path, &e)),
        }
    }
}

fn drafts_error(path: &Path, error: &dyn std::fmt::Display) -> ClientError {
    ClientError::Drafts(format!("{}: {error}", path.display()))
}

// =============================================================================
// CREATE WITH FALLBACK
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome<T> {
    /// The server confirmed the create; the record when its reply carried one.
    Created(Option<T>),
    /// The server was unreachable; the draft was stored locally.
    Drafted { pending: usize },
}

/// Create a record, keeping the draft locally if the server cannot be
/// reached.
///
/// # Errors
///
/// Returns validation and server errors unchanged (no draft is stored), and
/// [`ClientError::Drafts`] when the fallback write itself fails.
pub async fn create_with_fallback<T>(
    api: &ApiClient,
    store: &mut ResourceStore<T>,
    drafts: &DraftStore,
    draft: &T::Draft,
) -> Result<CreateOutcome<T>, ClientError>
where
    T: Resource,
    T::Draft: DeserializeOwned + Clone,
{
    match submit(api, store, &FormMode::Create, draft).await {
        Ok(saved) => Ok(CreateOutcome::Created(saved)),
        Err(ClientError::NoResponse(reason)) => {
            let pending = drafts.push(T::COLLECTION, draft.clone()).map_err(|e| {
                if let Some(notification) = e.notification() {
                    api.notify(notification);
                }
                e
            })?;
            warn!(collection = T::COLLECTION, %reason, pending, "server unreachable; draft stored locally");
            api.notify(Notification::success(
                "Saved as draft",
                format!("{} saved locally and will be sent on the next sync", T::LABEL),
            ));
            Ok(CreateOutcome::Drafted { pending })
        }
        Err(e) => Err(e),
    }
}

// =============================================================================
// SYNC
// =============================================================================

#[derive(Debug)]
pub struct SyncReport {
    /// Drafts the server confirmed.
    pub created: usize,
    /// Drafts the server or validation refused, with the reason. These are
    /// dropped from local storage.
    pub rejected: Vec<String>,
    /// Drafts still stored because the server was unreachable.
    pub remaining: usize,
}

/// Submit every stored draft for `T` through the normal form flow.
///
/// # Errors
///
/// Returns [`ClientError::Drafts`] when the stored drafts cannot be read or
/// the remainder cannot be written back.
pub async fn sync_drafts<T>(
    api: &ApiClient,
    store: &mut ResourceStore<T>,
    drafts: &DraftStore,
) -> Result<SyncReport, ClientError>
where
    T: Resource,
    T::Draft: DeserializeOwned + Clone,
{
    let stored: Vec<T::Draft> = drafts.load(T::COLLECTION)?;
    let mut report = SyncReport { created: 0, rejected: Vec::new(), remaining: 0 };
    let mut kept = Vec::new();

    for draft in stored {
        match submit(api, store, &FormMode::Create, &draft).await {
            Ok(_) => report.created += 1,
            Err(ClientError::NoResponse(_)) => kept.push(draft),
            Err(e) => report.rejected.push(e.to_string()),
        }
    }

    report.remaining = kept.len();
    if kept.is_empty() {
        drafts.clear(T::COLLECTION)?;
    } else {
        drafts.save(T::COLLECTION, &kept)?;
    }

    info!(
        collection = T::COLLECTION,
        created = report.created,
        rejected = report.rejected.len(),
        remaining = report.remaining,
        "draft sync finished"
    );
    Ok(report)
}
