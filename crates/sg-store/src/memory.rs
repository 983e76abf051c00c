//! In-memory reference backend
//!
//! [`MemoryStore`] implements [`GardenStore`] over plain JSON rows with a
//! synchronous change-feed fan-out: every committed mutation is dispatched
//! to matching subscribers in commit order before the mutating call
//! returns. Tests and local development run against it in place of the
//! hosted backend.
//!
//! Beyond the trait surface it exposes the mutators the server-side agent
//! workers use against the real store (`upsert`, `delete`) plus failure
//! injection for exercising degraded paths.

use crate::error::StoreError;
use crate::event::{ChangeKind, EventFilter, RowChange};
use crate::store::{EqFilter, GardenStore, OrderBy, SortOrder};
use crate::subscription::Subscription;
use async_trait::async_trait;
use chrono::DateTime;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug)]
struct Listener {
    id: u64,
    collection: String,
    kinds: EventFilter,
    filter: Option<EqFilter>,
    tx: mpsc::UnboundedSender<RowChange>,
}

impl Listener {
    fn wants(&self, collection: &str, kind: ChangeKind, row: &Value) -> bool {
        self.collection == collection
            && self.kinds.matches(kind)
            && self.filter.as_ref().map_or(true, |f| f.accepts(row))
    }
}

/// In-memory [`GardenStore`] backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    listeners: Arc<Mutex<Vec<Listener>>>,
    next_listener: AtomicU64,
    fail_fetches: AtomicBool,
    fail_inserts: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rows without emitting feed events
    ///
    /// Models state that existed before the client connected.
    pub fn seed(&self, collection: &str, rows: Vec<Value>) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .extend(rows);
    }

    /// Insert or replace the row whose `key_column` matches, emitting the
    /// corresponding feed event
    ///
    /// Rows missing `key_column` are rejected and logged.
    pub fn upsert(&self, collection: &str, key_column: &str, row: Value) {
        let Some(key) = row.get(key_column).cloned() else {
            tracing::warn!(collection, key_column, "upsert row missing key column");
            return;
        };

        let kind = {
            let mut collections = self.collections.write();
            let rows = collections.entry(collection.to_string()).or_default();
            match rows.iter_mut().find(|r| r.get(key_column) == Some(&key)) {
                Some(existing) => {
                    *existing = row.clone();
                    ChangeKind::Update
                }
                None => {
                    rows.push(row.clone());
                    ChangeKind::Insert
                }
            }
        };
        self.dispatch(collection, kind, row);
    }

    /// Remove the row whose `key_column` equals `key`, emitting a delete
    /// event carrying the old row
    pub fn delete(&self, collection: &str, key_column: &str, key: &str) {
        let key = Value::String(key.to_string());
        let removed = {
            let mut collections = self.collections.write();
            let Some(rows) = collections.get_mut(collection) else {
                return;
            };
            let mut removed = Vec::new();
            rows.retain(|r| {
                if r.get(key_column) == Some(&key) {
                    removed.push(r.clone());
                    false
                } else {
                    true
                }
            });
            removed
        };
        for old in removed {
            self.dispatch(collection, ChangeKind::Delete, old);
        }
    }

    /// Make subsequent bulk and point queries fail
    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, AtomicOrdering::SeqCst);
    }

    /// Make subsequent inserts fail
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, AtomicOrdering::SeqCst);
    }

    /// Number of rows currently in `collection`
    #[must_use]
    pub fn row_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, Vec::len)
    }

    fn dispatch(&self, collection: &str, kind: ChangeKind, row: Value) {
        let mut listeners = self.listeners.lock();
        listeners.retain(|listener| {
            if !listener.wants(collection, kind, &row) {
                return !listener.tx.is_closed();
            }
            // A send error means the subscriber hung up; drop the listener.
            listener
                .tx
                .send(RowChange::new(kind, row.clone()))
                .is_ok()
        });
    }
}

/// Order rows the way the hosted backend does: timestamps chronologically,
/// numbers numerically, everything else lexically by its JSON rendering.
fn compare_column(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => {
            match (
                DateTime::parse_from_rfc3339(a),
                DateTime::parse_from_rfc3339(b),
            ) {
                (Ok(ta), Ok(tb)) => ta.cmp(&tb),
                _ => a.cmp(b),
            }
        }
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl GardenStore for MemoryStore {
    async fn fetch(
        &self,
        collection: &str,
        filter: Option<EqFilter>,
        order: Option<OrderBy>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError> {
        if self.fail_fetches.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Query("injected fetch failure".to_string()));
        }

        let mut rows: Vec<Value> = self
            .collections
            .read()
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|r| filter.as_ref().map_or(true, |f| f.accepts(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ord = compare_column(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                match order.order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn fetch_one(
        &self,
        collection: &str,
        key_column: &str,
        key: &str,
    ) -> Result<Option<Value>, StoreError> {
        if self.fail_fetches.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Query("injected fetch failure".to_string()));
        }

        let key = Value::String(key.to_string());
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|rows| rows.iter().find(|r| r.get(key_column) == Some(&key)))
            .cloned())
    }

    async fn insert(&self, collection: &str, row: Value) -> Result<(), StoreError> {
        if self.fail_inserts.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Write("injected insert failure".to_string()));
        }

        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(row.clone());
        self.dispatch(collection, ChangeKind::Insert, row);
        Ok(())
    }

    fn subscribe(
        &self,
        collection: &str,
        kinds: EventFilter,
        filter: Option<EqFilter>,
    ) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_listener.fetch_add(1, AtomicOrdering::SeqCst);
        self.listeners.lock().push(Listener {
            id,
            collection: collection.to_string(),
            kinds,
            filter,
            tx,
        });

        let registry = Arc::clone(&self.listeners);
        Subscription::new(
            rx,
            Box::new(move || registry.lock().retain(|l| l.id != id)),
        )
    }
}
