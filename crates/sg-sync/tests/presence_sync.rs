//! Presence synchronization over the in-memory backend
//!
//! End-to-end coverage of the presence controller: roster priming, lazy
//! name resolution, deletes racing lookups, malformed intake, and
//! teardown.

use sg_core::types::AgentId;
use sg_core::UNKNOWN_SPIRIT;
use sg_store::{collections, GardenStore, MemoryStore};
use sg_sync::{presence_roster, PresenceSync};
use sg_test_utils::{agent_row, init_tracing, presence_row, seeded_store, settle, wait_until};
use std::sync::Arc;

async fn presence_for(store: &Arc<MemoryStore>) -> PresenceSync {
    let mut presence = PresenceSync::new(Arc::clone(store) as Arc<dyn GardenStore>);
    presence.initialize().await.unwrap();
    presence
}

#[tokio::test]
async fn initialize_merges_roster_and_presence() {
    init_tracing();
    let store = seeded_store();
    store.seed(
        collections::PRESENCE,
        vec![
            presence_row("fern", 1.0, 0.0, 2.0, "tending"),
            presence_row("stranger", 0.0, 0.0, 0.0, "lurking"),
        ],
    );

    let presence = presence_for(&store).await;
    let views = presence_roster(presence.cache());
    assert_eq!(views.len(), 2);

    let fern = views.iter().find(|v| v.agent_id.as_str() == "fern").unwrap();
    assert_eq!(fern.name, "Fern");

    // Not in the roster snapshot: sentinel, no speculative lookup.
    let stranger = views
        .iter()
        .find(|v| v.agent_id.as_str() == "stranger")
        .unwrap();
    assert_eq!(stranger.name, UNKNOWN_SPIRIT);
}

#[tokio::test]
async fn unknown_agent_shows_sentinel_then_resolves() {
    init_tracing();
    let store = seeded_store();
    let presence = presence_for(&store).await;

    // Aria joined the roster after our snapshot was taken; seeding emits
    // no feed event, so only the lazy lookup can find her name.
    store.seed(collections::AGENTS, vec![agent_row("aria", "Aria")]);
    store.upsert(
        collections::PRESENCE,
        "agent_id",
        presence_row("aria", 0.0, 0.0, 0.0, "idle"),
    );

    assert!(wait_until(|| presence.cache().contains(&AgentId::from("aria"))).await);
    assert!(
        wait_until(|| {
            presence
                .cache()
                .get(&AgentId::from("aria"))
                .is_some_and(|r| r.name.as_deref() == Some("Aria"))
        })
        .await
    );
}

#[tokio::test]
async fn update_preserves_resolved_name() {
    init_tracing();
    let store = seeded_store();
    let presence = presence_for(&store).await;

    store.upsert(
        collections::PRESENCE,
        "agent_id",
        presence_row("fern", 1.0, 0.0, 1.0, "idle"),
    );
    assert!(
        wait_until(|| {
            presence
                .cache()
                .get(&AgentId::from("fern"))
                .is_some_and(|r| r.name.as_deref() == Some("Fern"))
        })
        .await
    );

    store.upsert(
        collections::PRESENCE,
        "agent_id",
        presence_row("fern", 5.0, 0.0, -3.0, "wandering"),
    );
    assert!(
        wait_until(|| {
            presence
                .cache()
                .get(&AgentId::from("fern"))
                .is_some_and(|r| r.current_action == "wandering")
        })
        .await
    );
    let record = presence.cache().get(&AgentId::from("fern")).unwrap();
    assert_eq!(record.name.as_deref(), Some("Fern"));
    assert_eq!(record.position.x, 5.0);
}

#[tokio::test]
async fn delete_removes_record() {
    init_tracing();
    let store = seeded_store();
    store.seed(
        collections::PRESENCE,
        vec![presence_row("fern", 0.0, 0.0, 0.0, "idle")],
    );
    let presence = presence_for(&store).await;
    assert_eq!(presence.presences().len(), 1);

    store.delete(collections::PRESENCE, "agent_id", "fern");

    assert!(wait_until(|| presence.presences().is_empty()).await);
    assert!(presence_roster(presence.cache()).is_empty());
}

#[tokio::test]
async fn delete_racing_name_lookup_never_resurrects() {
    init_tracing();
    let store = seeded_store();
    let presence = presence_for(&store).await;

    // Insert for an agent whose name needs a lookup, then delete before
    // (or while) that lookup resolves.
    store.seed(collections::AGENTS, vec![agent_row("aria", "Aria")]);
    store.upsert(
        collections::PRESENCE,
        "agent_id",
        presence_row("aria", 0.0, 0.0, 0.0, "idle"),
    );
    store.delete(collections::PRESENCE, "agent_id", "aria");

    assert!(wait_until(|| !presence.cache().contains(&AgentId::from("aria"))).await);
    // Give the stray lookup completion every chance to misbehave.
    settle().await;
    settle().await;
    assert!(!presence.cache().contains(&AgentId::from("aria")));
    assert!(presence_roster(presence.cache()).is_empty());
}

#[tokio::test]
async fn failed_lookup_keeps_sentinel() {
    init_tracing();
    let store = seeded_store();
    let presence = presence_for(&store).await;

    // No roster row for this agent anywhere; the lookup finds nothing and
    // the error path leaves the sentinel in place.
    store.upsert(
        collections::PRESENCE,
        "agent_id",
        presence_row("ghost", 0.0, 0.0, 0.0, "haunting"),
    );

    assert!(wait_until(|| presence.cache().contains(&AgentId::from("ghost"))).await);
    settle().await;
    let views = presence_roster(presence.cache());
    assert_eq!(views[0].name, UNKNOWN_SPIRIT);
}

#[tokio::test]
async fn malformed_presence_row_is_rejected_at_intake() {
    init_tracing();
    let store = seeded_store();
    let presence = presence_for(&store).await;

    store.upsert(
        collections::PRESENCE,
        "agent_id",
        serde_json::json!({"agent_id": "broken", "current_action": "missing position"}),
    );
    store.upsert(
        collections::PRESENCE,
        "agent_id",
        presence_row("fern", 0.0, 0.0, 0.0, "fine"),
    );

    assert!(wait_until(|| presence.cache().contains(&AgentId::from("fern"))).await);
    assert!(!presence.cache().contains(&AgentId::from("broken")));
    assert_eq!(presence.presences().len(), 1);
}

#[tokio::test]
async fn bulk_load_failure_degrades_to_empty_then_recovers() {
    init_tracing();
    let store = seeded_store();
    store.seed(
        collections::PRESENCE,
        vec![presence_row("fern", 0.0, 0.0, 0.0, "idle")],
    );

    store.set_fail_fetches(true);
    let presence = presence_for(&store).await;
    assert!(presence.presences().is_empty());
    assert!(presence.names().is_empty());

    // Feed events flow regardless, and lookups work once reads recover.
    store.set_fail_fetches(false);
    store.upsert(
        collections::PRESENCE,
        "agent_id",
        presence_row("rook", 2.0, 0.0, 2.0, "resting"),
    );
    assert!(
        wait_until(|| {
            presence
                .cache()
                .get(&AgentId::from("rook"))
                .is_some_and(|r| r.name.as_deref() == Some("Rook"))
        })
        .await
    );
}

#[tokio::test]
async fn shutdown_stops_event_application() {
    init_tracing();
    let store = seeded_store();
    let mut presence = presence_for(&store).await;
    presence.shutdown();
    assert!(!presence.is_live());

    store.upsert(
        collections::PRESENCE,
        "agent_id",
        presence_row("fern", 0.0, 0.0, 0.0, "idle"),
    );

    settle().await;
    assert!(presence.presences().is_empty());
}
