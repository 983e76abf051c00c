//! The store capability consumed by the sync engine
//!
//! [`GardenStore`] is the full surface the synchronization core needs from
//! its real-time backend: bulk query, point query, keyed insert, and a
//! change-feed subscription. Durability, replication, and reconnection are
//! the backend's business, not part of this contract.

use crate::error::StoreError;
use crate::event::EventFilter;
use crate::subscription::Subscription;
use async_trait::async_trait;
use serde_json::Value;

/// Collection names as provisioned in the garden schema
pub mod collections {
    /// Chat messages, scoped by `garden_id`
    pub const CHAT_MESSAGES: &str = "sg_chat_messages";
    /// Live agent presence, keyed by `agent_id`
    pub const PRESENCE: &str = "sg_presence";
    /// Agent roster (ids and display names)
    pub const AGENTS: &str = "sg_agents";
}

/// Equality predicate on one column
#[derive(Debug, Clone, PartialEq)]
pub struct EqFilter {
    /// Column to compare
    pub column: String,
    /// Value the column must equal
    pub value: Value,
}

impl EqFilter {
    /// Build a filter comparing `column` against `value`
    #[inline]
    #[must_use]
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Whether `row` satisfies this predicate
    #[must_use]
    pub fn accepts(&self, row: &Value) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

/// Sort direction for bulk queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// Ordering clause for bulk queries
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Column to sort on
    pub column: String,
    /// Direction
    pub order: SortOrder,
}

impl OrderBy {
    /// Sort ascending on `column`
    #[inline]
    #[must_use]
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Ascending,
        }
    }

    /// Sort descending on `column`
    #[inline]
    #[must_use]
    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Descending,
        }
    }
}

/// Real-time data backend capability
///
/// Write success is observed only through the change feed: `insert`
/// resolving `Ok` means the write was accepted, not that local state
/// should change.
#[async_trait]
pub trait GardenStore: Send + Sync {
    /// Bulk query: rows from `collection`, optionally filtered, ordered,
    /// and limited
    async fn fetch(
        &self,
        collection: &str,
        filter: Option<EqFilter>,
        order: Option<OrderBy>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError>;

    /// Point query: the single row whose `key_column` equals `key`
    async fn fetch_one(
        &self,
        collection: &str,
        key_column: &str,
        key: &str,
    ) -> Result<Option<Value>, StoreError>;

    /// Insert a row with a caller-specified id
    async fn insert(&self, collection: &str, row: Value) -> Result<(), StoreError>;

    /// Register a change-feed listener for `collection`
    ///
    /// Matching events are delivered in backend commit order until the
    /// returned handle is released.
    fn subscribe(
        &self,
        collection: &str,
        kinds: EventFilter,
        filter: Option<EqFilter>,
    ) -> Subscription;
}
