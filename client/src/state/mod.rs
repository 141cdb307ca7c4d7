//! Client-side state.
//!
//! DESIGN
//! ======
//! One [`store::ResourceStore`] per entity collection. Stores are plain
//! values owned by whoever renders them; controllers borrow them mutably
//! for the duration of one action.

pub mod store;

pub use store::{ResourceStore, matches_query};
