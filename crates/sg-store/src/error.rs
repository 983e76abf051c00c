//! Error types for the store boundary

/// Errors produced by a [`crate::GardenStore`] backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A bulk or point query failed
    #[error("query failed: {0}")]
    Query(String),

    /// A write was rejected or lost
    #[error("write failed: {0}")]
    Write(String),

    /// A row could not be decoded into the requested shape
    #[error("row decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// The backend connection is gone
    #[error("store closed")]
    Closed,
}

impl StoreError {
    /// Whether the caller may reasonably retry
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Query(_) | Self::Write(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::Query("boom".to_string());
        assert!(err.to_string().contains("query failed"));
    }

    #[test]
    fn transient_classification() {
        assert!(StoreError::Query("x".to_string()).is_transient());
        assert!(!StoreError::Closed.is_transient());
    }
}
