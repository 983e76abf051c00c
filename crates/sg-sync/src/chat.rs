//! Chat synchronization controller
//!
//! Owns the message log for one garden scope:
//! - seeds it with a bulk load of recent history
//! - merges change-feed inserts, recognizing echoes of optimistic sends
//! - appends locally-authored messages optimistically and persists them
//!   fire-and-forget
//!
//! The subscription is a scoped resource: it is acquired by `initialize`
//! and released on `shutdown` or drop, on every exit path.

use crate::cache::MessageLog;
use chrono::Utc;
use sg_core::config::SyncConfig;
use sg_core::error::SyncError;
use sg_core::types::{ChatMessage, GardenId, MessageId};
use sg_store::{collections, ChangeKind, EqFilter, EventFilter, GardenStore, OrderBy, RowChange};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Synchronization controller for one garden's chat stream
pub struct ChatSync {
    store: Arc<dyn GardenStore>,
    config: SyncConfig,
    scope: GardenId,
    log: Arc<MessageLog>,
    live: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl ChatSync {
    /// Create a controller for `scope`; no I/O happens until `initialize`
    #[must_use]
    pub fn new(store: Arc<dyn GardenStore>, config: SyncConfig, scope: GardenId) -> Self {
        Self {
            store,
            config,
            scope,
            log: Arc::new(MessageLog::new()),
            live: Arc::new(AtomicBool::new(true)),
            task: None,
        }
    }

    /// Bulk-load recent history and open the change-feed subscription
    ///
    /// The bulk read fetches up to `chat_history_limit` of the most recent
    /// messages and seeds the log in ascending time order. A read error
    /// degrades silently to an empty log; the caller only sees it as an
    /// empty state.
    pub async fn initialize(&mut self) -> Result<(), SyncError> {
        if self.task.is_some() {
            return Err(SyncError::AlreadyInitialized);
        }

        let scope_filter = EqFilter::new("garden_id", self.scope.as_str());
        match self
            .store
            .fetch(
                collections::CHAT_MESSAGES,
                Some(scope_filter.clone()),
                Some(OrderBy::descending("created_at")),
                Some(self.config.chat_history_limit),
            )
            .await
        {
            Ok(mut rows) => {
                // Newest-first fetch keeps the limit on the recent end;
                // reversing restores display order.
                rows.reverse();
                let messages = rows
                    .into_iter()
                    .filter_map(|row| match serde_json::from_value::<ChatMessage>(row) {
                        Ok(message) => Some(message),
                        Err(error) => {
                            tracing::warn!(%error, "malformed chat row in bulk load");
                            None
                        }
                    })
                    .collect();
                self.log.seed(messages);
                tracing::debug!(scope = %self.scope, count = self.log.len(), "chat history loaded");
            }
            Err(error) => {
                tracing::warn!(scope = %self.scope, %error, "chat bulk load failed, starting empty");
            }
        }

        let mut subscription = self.store.subscribe(
            collections::CHAT_MESSAGES,
            EventFilter::Only(ChangeKind::Insert),
            Some(scope_filter),
        );

        let log = Arc::clone(&self.log);
        let live = Arc::clone(&self.live);
        self.task = Some(tokio::spawn(async move {
            while let Some(change) = subscription.next().await {
                if !live.load(Ordering::SeqCst) {
                    break;
                }
                Self::apply_remote_insert(&log, change);
            }
        }));
        Ok(())
    }

    fn apply_remote_insert(log: &MessageLog, change: RowChange) {
        let message = match serde_json::from_value::<ChatMessage>(change.row) {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(%error, "malformed chat row on feed, dropped");
                return;
            }
        };

        if log.append_if_absent(message) {
            tracing::debug!("remote chat message appended");
        } else {
            // Echo of an optimistic send; the local copy stays untouched.
            tracing::debug!("feed echoed a known message id, ignored");
        }
    }

    /// Author a message: optimistic append, then fire-and-forget persist
    ///
    /// Whitespace-only content is a no-op returning `None` — nothing is
    /// cached and no write is issued. Otherwise the returned id identifies
    /// the entry that is already visible in the log; the persisted write
    /// reuses it so the feed echo is recognized as the same logical write.
    pub fn send(&self, content: &str, sender_name: Option<&str>) -> Option<MessageId> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }

        let message = ChatMessage {
            id: MessageId::generate(),
            garden_id: self.scope.clone(),
            sender_id: self.config.local_sender_id.clone(),
            sender_name: sender_name
                .unwrap_or(&self.config.default_sender_name)
                .to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let id = message.id.clone();

        self.log.append_if_absent(message.clone());

        match serde_json::to_value(&message) {
            Ok(row) => {
                let store = Arc::clone(&self.store);
                let message_id = id.clone();
                tokio::spawn(async move {
                    // Failure is not surfaced into the log; the optimistic
                    // entry stays visible until the next full reload.
                    if let Err(error) = store.insert(collections::CHAT_MESSAGES, row).await {
                        tracing::warn!(id = %message_id, %error, "chat write failed, entry is local-only");
                    }
                });
            }
            Err(error) => {
                tracing::warn!(id = %id, %error, "chat row encode failed, entry is local-only");
            }
        }

        Some(id)
    }

    /// Snapshot of the log in display order
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.log.snapshot()
    }

    /// The underlying log, for projections
    #[must_use]
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// The garden scope this controller serves
    #[must_use]
    pub fn scope(&self) -> &GardenId {
        &self.scope
    }

    /// Whether the controller still applies feed events
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Release the subscription and stop applying events
    ///
    /// Idempotent. Must run on every exit path (scope change or discard)
    /// so repeated scope transitions do not leak listeners.
    pub fn shutdown(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ChatSync {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ChatSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSync")
            .field("scope", &self.scope)
            .field("messages", &self.log.len())
            .field("live", &self.is_live())
            .finish()
    }
}
