//! Sync engine configuration

use crate::types::GardenId;
use serde::{Deserialize, Serialize};

/// Configuration for the synchronization controllers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How many recent messages the chat bulk load fetches
    pub chat_history_limit: usize,
    /// Garden scope used when the caller does not pick one
    pub default_garden: GardenId,
    /// Sender id stamped on locally-authored messages
    pub local_sender_id: String,
    /// Display name used when the caller does not supply one
    pub default_sender_name: String,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a chat history limit
    #[inline]
    #[must_use]
    pub fn with_chat_history_limit(mut self, limit: usize) -> Self {
        self.chat_history_limit = limit;
        self
    }

    /// With a default garden scope
    #[inline]
    #[must_use]
    pub fn with_default_garden(mut self, garden: GardenId) -> Self {
        self.default_garden = garden;
        self
    }

    /// With a local sender identity
    #[inline]
    #[must_use]
    pub fn with_local_sender(
        mut self,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
    ) -> Self {
        self.local_sender_id = sender_id.into();
        self.default_sender_name = sender_name.into();
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chat_history_limit: 50,
            default_garden: GardenId::main(),
            local_sender_id: "user".to_string(),
            default_sender_name: "Dana".to_string(),
        }
    }
}
