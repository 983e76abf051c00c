//! Presence synchronization controller
//!
//! Maintains the keyed presence collection for every agent in the garden.
//! Unlike chat, nothing here is optimistic: the local client is purely a
//! consumer of the feed, and records are created, updated, and deleted
//! strictly in response to store events.
//!
//! Name resolution is a second, independent state transition: an
//! insert/update for an unknown agent is stored immediately with no name
//! (projected as the sentinel), and a point lookup runs in the background.
//! Its completion re-checks key liveness before writing, so a lookup
//! racing a delete can never resurrect the record.

use crate::cache::PresenceCache;
use crate::names::NameResolver;
use serde::Deserialize;
use sg_core::error::SyncError;
use sg_core::types::{AgentId, AgentRow, PresenceRecord, PresenceRow};
use sg_store::{collections, ChangeKind, EventFilter, GardenStore, RowChange};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Key-only view of a presence row, for delete events whose old-row
/// payload may be partial
#[derive(Debug, Deserialize)]
struct PresenceKey {
    agent_id: AgentId,
}

/// Synchronization controller for the garden-wide presence stream
pub struct PresenceSync {
    store: Arc<dyn GardenStore>,
    cache: Arc<PresenceCache>,
    names: Arc<NameResolver>,
    live: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl PresenceSync {
    /// Create a controller; no I/O happens until `initialize`
    #[must_use]
    pub fn new(store: Arc<dyn GardenStore>) -> Self {
        let names = Arc::new(NameResolver::new(Arc::clone(&store)));
        Self {
            store,
            cache: Arc::new(PresenceCache::new()),
            names,
            live: Arc::new(AtomicBool::new(true)),
            task: None,
        }
    }

    /// Prime the name cache, load current presence, and subscribe
    ///
    /// Two bulk reads run first: the full roster (id → name) and the full
    /// presence set. Either failing degrades to the corresponding empty
    /// set. The subscription then covers all change kinds with no scope
    /// filter — presence is garden-wide.
    pub async fn initialize(&mut self) -> Result<(), SyncError> {
        if self.task.is_some() {
            return Err(SyncError::AlreadyInitialized);
        }

        match self.store.fetch(collections::AGENTS, None, None, None).await {
            Ok(rows) => {
                let roster = rows.into_iter().filter_map(|row| {
                    match serde_json::from_value::<AgentRow>(row) {
                        Ok(agent) => Some(agent),
                        Err(error) => {
                            tracing::warn!(%error, "malformed roster row in bulk load");
                            None
                        }
                    }
                });
                self.names.prime(roster);
                tracing::debug!(count = self.names.len(), "roster primed");
            }
            Err(error) => {
                tracing::warn!(%error, "roster load failed, names will resolve lazily");
            }
        }

        match self
            .store
            .fetch(collections::PRESENCE, None, None, None)
            .await
        {
            Ok(rows) => {
                for row in rows {
                    match serde_json::from_value::<PresenceRow>(row) {
                        Ok(row) => {
                            let name = self.names.cached(&row.agent_id);
                            self.cache.upsert(row, name);
                        }
                        Err(error) => {
                            tracing::warn!(%error, "malformed presence row in bulk load");
                        }
                    }
                }
                tracing::debug!(count = self.cache.len(), "presence loaded");
            }
            Err(error) => {
                tracing::warn!(%error, "presence load failed, starting empty");
            }
        }

        let mut subscription = self
            .store
            .subscribe(collections::PRESENCE, EventFilter::All, None);

        let cache = Arc::clone(&self.cache);
        let names = Arc::clone(&self.names);
        let live = Arc::clone(&self.live);
        self.task = Some(tokio::spawn(async move {
            while let Some(change) = subscription.next().await {
                if !live.load(Ordering::SeqCst) {
                    break;
                }
                Self::apply_change(&cache, &names, &live, change);
            }
        }));
        Ok(())
    }

    /// Apply one feed event to the cache
    ///
    /// Insert and update both upsert; delete removes the key. Malformed
    /// rows are rejected at intake and logged, never propagated.
    fn apply_change(
        cache: &Arc<PresenceCache>,
        names: &Arc<NameResolver>,
        live: &Arc<AtomicBool>,
        change: RowChange,
    ) {
        match change.kind {
            ChangeKind::Insert | ChangeKind::Update => {
                let row = match serde_json::from_value::<PresenceRow>(change.row) {
                    Ok(row) => row,
                    Err(error) => {
                        tracing::warn!(%error, "malformed presence row on feed, dropped");
                        return;
                    }
                };
                let agent_id = row.agent_id.clone();
                let known = names.cached(&agent_id);
                if cache.upsert(row, known) {
                    Self::resolve_later(cache, names, live, agent_id);
                }
            }
            ChangeKind::Delete => {
                match serde_json::from_value::<PresenceKey>(change.row) {
                    Ok(key) => {
                        cache.remove(&key.agent_id);
                        tracing::debug!(agent_id = %key.agent_id, "presence removed");
                    }
                    Err(error) => {
                        tracing::warn!(%error, "delete event without agent id, dropped");
                    }
                }
            }
        }
    }

    /// Spawn the lazy name lookup for a record stored with the sentinel
    ///
    /// The lookup is not cancelled on teardown; instead its completion
    /// checks controller liveness, and the cache write itself only applies
    /// if the agent is still present.
    fn resolve_later(
        cache: &Arc<PresenceCache>,
        names: &Arc<NameResolver>,
        live: &Arc<AtomicBool>,
        agent_id: AgentId,
    ) {
        let cache = Arc::clone(cache);
        let names = Arc::clone(names);
        let live = Arc::clone(live);
        tokio::spawn(async move {
            let Some(name) = names.resolve(&agent_id).await else {
                return;
            };
            if !live.load(Ordering::SeqCst) {
                return;
            }
            if !cache.resolve_name(&agent_id, name) {
                tracing::debug!(agent_id = %agent_id, "agent left before name resolved");
            }
        });
    }

    /// Snapshot of all live records, arbitrary order
    #[must_use]
    pub fn presences(&self) -> Vec<PresenceRecord> {
        self.cache.snapshot()
    }

    /// The underlying cache, for projections
    #[must_use]
    pub fn cache(&self) -> &PresenceCache {
        &self.cache
    }

    /// The name resolver backing this controller
    #[must_use]
    pub fn names(&self) -> &NameResolver {
        &self.names
    }

    /// Whether the controller still applies feed events
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Release the subscription and stop applying events
    ///
    /// Idempotent; in-flight name lookups are left to finish but their
    /// completions observe the dead liveness flag and write nothing.
    pub fn shutdown(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for PresenceSync {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PresenceSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceSync")
            .field("agents", &self.cache.len())
            .field("live", &self.is_live())
            .finish()
    }
}
