//! Agent display-name resolution
//!
//! Names are treated as immutable for the session: the cache is primed
//! once from the full roster and extended by point lookups for agents that
//! appear later. Entries are only ever added or superseded by a fresher
//! lookup, never evicted.

use dashmap::DashMap;
use sg_core::types::{AgentId, AgentRow};
use sg_store::{collections, GardenStore};
use std::sync::Arc;

/// Memoizing agent id → display name lookup
pub struct NameResolver {
    store: Arc<dyn GardenStore>,
    cache: DashMap<AgentId, String>,
}

impl NameResolver {
    /// Create a resolver over the given store
    #[must_use]
    pub fn new(store: Arc<dyn GardenStore>) -> Self {
        Self {
            store,
            cache: DashMap::new(),
        }
    }

    /// Bulk-populate from a roster snapshot
    pub fn prime(&self, roster: impl IntoIterator<Item = AgentRow>) {
        for agent in roster {
            self.cache.insert(agent.id, agent.name);
        }
    }

    /// Cache-only read
    #[must_use]
    pub fn cached(&self, agent_id: &AgentId) -> Option<String> {
        self.cache.get(agent_id).map(|r| r.value().clone())
    }

    /// Resolve a name, falling back to a point query on a cache miss
    ///
    /// A successful lookup is memoized (superseding any prior entry). A
    /// failed or empty lookup resolves to `None`; the error is swallowed —
    /// callers keep showing the sentinel rather than entering an error
    /// state.
    pub async fn resolve(&self, agent_id: &AgentId) -> Option<String> {
        if let Some(name) = self.cached(agent_id) {
            return Some(name);
        }

        let row = match self
            .store
            .fetch_one(collections::AGENTS, "id", agent_id.as_str())
            .await
        {
            Ok(Some(row)) => row,
            Ok(None) => {
                tracing::debug!(agent_id = %agent_id, "agent not in roster");
                return None;
            }
            Err(error) => {
                tracing::debug!(agent_id = %agent_id, %error, "name lookup failed");
                return None;
            }
        };

        match serde_json::from_value::<AgentRow>(row) {
            Ok(agent) => {
                self.cache.insert(agent_id.clone(), agent.name.clone());
                Some(agent.name)
            }
            Err(error) => {
                tracing::warn!(agent_id = %agent_id, %error, "malformed roster row");
                None
            }
        }
    }

    /// Number of cached names
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no names are cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl std::fmt::Debug for NameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameResolver")
            .field("cached", &self.cache.len())
            .finish()
    }
}
