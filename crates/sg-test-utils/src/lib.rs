//! Testing utilities for the Soul Garden Sync workspace
//!
//! Shared row fixtures, a pre-seeded in-memory store, and async helpers
//! for waiting on feed-driven state.

#![allow(missing_docs)]

use serde_json::{json, Value};
use sg_store::{collections, MemoryStore};
use std::sync::{Arc, Once};
use tokio::time::{sleep, Duration, Instant};

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`; safe to call repeatedly.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A chat row as the store would deliver it.
pub fn chat_row(id: &str, garden: &str, content: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "garden_id": garden,
        "sender_id": "agent",
        "sender_name": "Fern",
        "content": content,
        "created_at": created_at,
    })
}

/// A presence row with the given position and action.
pub fn presence_row(agent_id: &str, x: f64, y: f64, z: f64, action: &str) -> Value {
    json!({
        "agent_id": agent_id,
        "position": {"x": x, "y": y, "z": z},
        "current_action": action,
    })
}

/// A roster row.
pub fn agent_row(id: &str, name: &str) -> Value {
    json!({"id": id, "name": name})
}

/// A store seeded with the two stock garden agents, no presence or chat.
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        collections::AGENTS,
        vec![agent_row("fern", "Fern"), agent_row("rook", "Rook")],
    );
    store
}

/// Poll `condition` until it holds or half a second passes.
///
/// Feed deliveries and deferred lookups land on background tasks; tests
/// assert on the settled state through this rather than sleeping for fixed
/// intervals.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(500);
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(5)).await;
    }
}

/// Give already-queued feed deliveries a chance to drain.
pub async fn settle() {
    sleep(Duration::from_millis(20)).await;
}
