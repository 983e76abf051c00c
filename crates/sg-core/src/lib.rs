//! Soul Garden Sync - core data model
//!
//! Shared types for the garden synchronization engine:
//! - Entity model (chat messages, presence records, positions)
//! - Identifier newtypes for gardens, agents, and messages
//! - Engine configuration
//! - Lifecycle error taxonomy

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::SyncConfig;
pub use error::SyncError;
pub use types::{
    AgentId, AgentRow, ChatMessage, GardenId, MessageId, Position, PresenceRecord, PresenceRow,
    UNKNOWN_SPIRIT, WORLD_MAX, WORLD_MIN,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
