//! Soul Garden Sync - store boundary
//!
//! The external-collaborator seam between the synchronization core and its
//! real-time data backend:
//! - [`GardenStore`]: bulk query, point query, keyed insert, subscribe
//! - [`RowChange`] / [`ChangeKind`]: change-feed notifications
//! - [`Subscription`]: scoped listener handle, released on drop
//! - [`MemoryStore`]: in-memory reference backend for tests and local runs

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod event;
pub mod memory;
pub mod store;
pub mod subscription;

// Re-exports for convenience
pub use error::StoreError;
pub use event::{ChangeKind, EventFilter, RowChange};
pub use memory::MemoryStore;
pub use store::{collections, EqFilter, GardenStore, OrderBy, SortOrder};
pub use subscription::Subscription;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
