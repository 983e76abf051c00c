//! Soul Garden Sync - synchronization engine
//!
//! Merges locally-originated optimistic mutations with authoritative
//! change-feed events for the garden's two entity streams:
//! - [`ChatSync`]: scoped chat history with optimistic sends and
//!   echo-back de-duplication
//! - [`PresenceSync`]: garden-wide agent presence with lazy display-name
//!   resolution
//! - [`projection`]: pure views over the caches for the rendering layer
//!
//! # Example
//!
//! ```rust,ignore
//! use sg_core::{GardenId, SyncConfig};
//! use sg_store::MemoryStore;
//! use sg_sync::ChatSync;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let mut chat = ChatSync::new(store, SyncConfig::new(), GardenId::main());
//! chat.initialize().await?;
//!
//! chat.send("hello garden", None);
//! println!("{} messages", chat.messages().len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod chat;
pub mod names;
pub mod presence;
pub mod projection;

// Re-exports for convenience
pub use cache::{MessageLog, PresenceCache};
pub use chat::ChatSync;
pub use names::NameResolver;
pub use presence::PresenceSync;
pub use projection::{message_timeline, presence_roster, to_display, DisplayPoint, PresenceView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
