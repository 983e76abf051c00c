//! Entity caches
//!
//! Each cache merges optimistic and authoritative records for one entity
//! kind, keyed by entity id. Every mutator is a single read-then-replace
//! under the cache's own lock, so arbitrary interleavings of feed
//! deliveries, local sends, and deferred lookups reduce to last-write-wins
//! per key.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use sg_core::types::{AgentId, ChatMessage, MessageId, PresenceRecord, PresenceRow};

/// Insertion-ordered, id-deduplicating chat message log
///
/// Append-only: the log never re-sorts. Bulk load seeds it in ascending
/// time order and later arrivals (optimistic sends, feed inserts) go to the
/// end, which preserves the ascending-by-creation-time display order with
/// ties broken by arrival.
#[derive(Debug, Default)]
pub struct MessageLog {
    inner: RwLock<IndexMap<MessageId, ChatMessage>>,
}

impl MessageLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole log with a bulk-load result
    ///
    /// `messages` must already be in display order. Duplicated ids keep
    /// their first occurrence.
    pub fn seed(&self, messages: Vec<ChatMessage>) {
        let mut inner = self.inner.write();
        inner.clear();
        for message in messages {
            inner.entry(message.id.clone()).or_insert(message);
        }
    }

    /// Append a message unless its id is already present
    ///
    /// Returns `false` for a duplicate, in which case the existing entry is
    /// kept byte-identical — a feed echo of an optimistic send must not
    /// overwrite the local copy.
    pub fn append_if_absent(&self, message: ChatMessage) -> bool {
        let mut inner = self.inner.write();
        match inner.entry(message.id.clone()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(message);
                true
            }
        }
    }

    /// Whether a message with this id is cached
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.inner.read().contains_key(id)
    }

    /// Messages in display order
    #[must_use]
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.inner.read().values().cloned().collect()
    }

    /// Number of cached messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Keyed presence cache, one live record per agent id
#[derive(Debug, Default)]
pub struct PresenceCache {
    inner: DashMap<AgentId, PresenceRecord>,
}

impl PresenceCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a validated presence row
    ///
    /// `resolved` is the name the caller already knows (from the roster or
    /// the name cache); when it is `None` an existing record's
    /// previously-resolved name is preserved. Returns `true` when the
    /// stored record still has no resolved name, i.e. a lazy lookup is
    /// needed.
    pub fn upsert(&self, row: PresenceRow, resolved: Option<String>) -> bool {
        match self.inner.entry(row.agent_id.clone()) {
            Entry::Occupied(mut slot) => {
                let name = resolved.or_else(|| slot.get().name.clone());
                let unresolved = name.is_none();
                slot.insert(row.into_record(name));
                unresolved
            }
            Entry::Vacant(slot) => {
                let unresolved = resolved.is_none();
                slot.insert(row.into_record(resolved));
                unresolved
            }
        }
    }

    /// Write a late-resolved name into an existing record
    ///
    /// The existence guard for lookups racing deletes: if the agent id is
    /// no longer cached the write is a no-op and `false` is returned —
    /// resolving a name must never resurrect a deleted record.
    pub fn resolve_name(&self, agent_id: &AgentId, name: String) -> bool {
        match self.inner.get_mut(agent_id) {
            Some(mut record) => {
                record.name = Some(name);
                true
            }
            None => false,
        }
    }

    /// Remove the record for an agent
    pub fn remove(&self, agent_id: &AgentId) {
        self.inner.remove(agent_id);
    }

    /// Clone the record for an agent, if present
    #[must_use]
    pub fn get(&self, agent_id: &AgentId) -> Option<PresenceRecord> {
        self.inner.get(agent_id).map(|r| r.value().clone())
    }

    /// Whether a record exists for this agent
    #[must_use]
    pub fn contains(&self, agent_id: &AgentId) -> bool {
        self.inner.contains_key(agent_id)
    }

    /// All live records, in arbitrary order
    #[must_use]
    pub fn snapshot(&self) -> Vec<PresenceRecord> {
        self.inner.iter().map(|r| r.value().clone()).collect()
    }

    /// Number of live records
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no agent is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use sg_core::types::{GardenId, Position};

    fn message(id: &str, content: &str) -> ChatMessage {
        ChatMessage {
            id: MessageId::from(id),
            garden_id: GardenId::main(),
            sender_id: "user".to_string(),
            sender_name: "Dana".to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    fn row(agent: &str, action: &str) -> PresenceRow {
        PresenceRow {
            agent_id: AgentId::from(agent),
            position: Position::origin(),
            current_action: action.to_string(),
        }
    }

    #[test]
    fn log_preserves_arrival_order() {
        let log = MessageLog::new();
        assert!(log.append_if_absent(message("a", "first")));
        assert!(log.append_if_absent(message("b", "second")));
        assert!(log.append_if_absent(message("c", "third")));

        let ids: Vec<String> = log.snapshot().into_iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn log_rejects_duplicate_and_keeps_original() {
        let log = MessageLog::new();
        let original = message("a", "original");
        assert!(log.append_if_absent(original.clone()));

        let mut echo = message("a", "echo with drifted fields");
        echo.sender_name = "Server".to_string();
        assert!(!log.append_if_absent(echo));

        assert_eq!(log.snapshot(), vec![original]);
    }

    #[test]
    fn seed_replaces_contents() {
        let log = MessageLog::new();
        log.append_if_absent(message("stale", "old"));

        log.seed(vec![message("a", "one"), message("b", "two")]);
        assert_eq!(log.len(), 2);
        assert!(!log.contains(&MessageId::from("stale")));
    }

    #[test]
    fn presence_upsert_preserves_resolved_name() {
        let cache = PresenceCache::new();
        assert!(!cache.upsert(row("x", "idle"), Some("Aria".to_string())));

        // A later update without a known name keeps the resolved one.
        assert!(!cache.upsert(row("x", "wandering"), None));
        let record = cache.get(&AgentId::from("x")).unwrap();
        assert_eq!(record.name.as_deref(), Some("Aria"));
        assert_eq!(record.current_action, "wandering");
    }

    #[test]
    fn presence_upsert_reports_unresolved() {
        let cache = PresenceCache::new();
        assert!(cache.upsert(row("x", "idle"), None));
        assert!(cache.get(&AgentId::from("x")).unwrap().name.is_none());
    }

    #[test]
    fn resolve_name_is_noop_for_absent_key() {
        let cache = PresenceCache::new();
        cache.upsert(row("x", "idle"), None);
        cache.remove(&AgentId::from("x"));

        assert!(!cache.resolve_name(&AgentId::from("x"), "Aria".to_string()));
        assert!(!cache.contains(&AgentId::from("x")));
    }
}
