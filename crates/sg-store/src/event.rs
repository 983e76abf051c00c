//! Change-feed event types
//!
//! The backing store reports row-level changes as a stream of
//! [`RowChange`] notifications, one per committed mutation, delivered in
//! commit order. Rows cross this boundary loosely typed; consumers
//! validate them into fixed shapes at intake.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of row-level change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A new row was committed
    Insert,
    /// An existing row was replaced
    Update,
    /// A row was removed
    Delete,
}

impl ChangeKind {
    /// Wire name of the kind
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Which change kinds a subscription wants delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    /// A single kind
    Only(ChangeKind),
    /// Every kind
    All,
}

impl EventFilter {
    /// Whether an event of `kind` passes this filter
    #[inline]
    #[must_use]
    pub fn matches(self, kind: ChangeKind) -> bool {
        match self {
            Self::Only(wanted) => wanted == kind,
            Self::All => true,
        }
    }
}

/// One delivered change notification
///
/// For inserts and updates `row` is the new row; for deletes it is the old
/// row (at minimum its key columns).
#[derive(Debug, Clone, PartialEq)]
pub struct RowChange {
    /// What happened
    pub kind: ChangeKind,
    /// The affected row
    pub row: Value,
}

impl RowChange {
    /// Create a change notification
    #[inline]
    #[must_use]
    pub fn new(kind: ChangeKind, row: Value) -> Self {
        Self { kind, row }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_only_matches_its_kind() {
        let filter = EventFilter::Only(ChangeKind::Insert);
        assert!(filter.matches(ChangeKind::Insert));
        assert!(!filter.matches(ChangeKind::Update));
        assert!(!filter.matches(ChangeKind::Delete));
    }

    #[test]
    fn filter_all_matches_everything() {
        for kind in [ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete] {
            assert!(EventFilter::All.matches(kind));
        }
    }

    #[test]
    fn kind_wire_names() {
        assert_eq!(ChangeKind::Insert.as_str(), "insert");
        assert_eq!(ChangeKind::Delete.as_str(), "delete");
    }
}
