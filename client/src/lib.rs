//! # erp-client
//!
//! Client-side logic for the plant and fleet ERP: sites, machines, units,
//! item groups, spare-part items, and material requisitions served by the
//! remote REST API under `/api/`.
//!
//! DESIGN
//! ======
//! Every screen of the ERP is a composition of the same few pieces, and this
//! crate holds exactly those pieces so any front-end (the `erp` CLI, a
//! future WASM UI) can drive them:
//!
//! - `net`: the API gateway (transport seam, JSON envelope handling,
//!   error-to-notification mapping).
//! - `state`: per-entity resource stores with local search.
//! - `forms` / `deletion`: validated submit and usage-guarded delete flows.
//! - `workflow`: the requisition status workflow controller.
//! - `dashboard`: the concurrent dashboard aggregator with keyed caching.
//! - `drafts`: local JSON fallback storage for unsent drafts.
//!
//! Controllers receive an explicit [`context::AppContext`] rather than
//! reaching into a global store.

pub mod config;
pub mod context;
pub mod dashboard;
pub mod deletion;
pub mod drafts;
pub mod error;
pub mod forms;
pub mod model;
pub mod net;
pub mod notify;
pub mod state;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{AppContext, Session};
pub use error::{ClientError, ErrorCode, FieldErrors};
