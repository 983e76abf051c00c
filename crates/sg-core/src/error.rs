//! Error types for the sync core
//!
//! The steady-state engine surfaces no errors — transient store failures
//! degrade to empty or stale state and are only logged. `SyncError` covers
//! controller misuse at construction and lifecycle boundaries.

/// Sync controller lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// `initialize` was called on an already-running controller
    #[error("controller already initialized")]
    AlreadyInitialized,

    /// An operation needing a live subscription ran before `initialize`
    #[error("controller not initialized")]
    NotInitialized,

    /// Configuration rejected at construction
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
