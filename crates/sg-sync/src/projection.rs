//! View projections
//!
//! Pure transforms from cache contents to the structures the presentation
//! layer reads. No side effects, no locks held across calls.

use crate::cache::{MessageLog, PresenceCache};
use sg_core::types::{AgentId, ChatMessage, Position, WORLD_MAX, WORLD_MIN};

/// A position mapped into display space
///
/// `x` and `y` are percentages of the viewport ([0, 100] for in-bounds
/// world coordinates); `elevation` carries the world y axis through
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPoint {
    /// Horizontal viewport percentage
    pub x: f64,
    /// Vertical viewport percentage (world z axis)
    pub y: f64,
    /// World elevation, passed through
    pub elevation: f64,
}

/// One presence record prepared for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceView {
    /// Agent id
    pub agent_id: AgentId,
    /// Resolved name, or the sentinel
    pub name: String,
    /// Raw world position
    pub position: Position,
    /// Position mapped into display space
    pub display: DisplayPoint,
    /// Activity label
    pub current_action: String,
}

/// Map a world position into display space
///
/// Deterministic affine transform from the navmesh range
/// ([`WORLD_MIN`], [`WORLD_MAX`]) on x and z to [0, 100]. Out-of-range
/// input is not clamped and projects outside the visible area.
#[must_use]
pub fn to_display(position: Position) -> DisplayPoint {
    const SPAN: f64 = WORLD_MAX - WORLD_MIN;
    DisplayPoint {
        x: (position.x - WORLD_MIN) / SPAN * 100.0,
        y: (position.z - WORLD_MIN) / SPAN * 100.0,
        elevation: position.y,
    }
}

/// Chronological message sequence for the chat panel
#[must_use]
pub fn message_timeline(log: &MessageLog) -> Vec<ChatMessage> {
    log.snapshot()
}

/// Presence records with resolved names, ordered by agent id
///
/// Drives both the spatial layout and the "who is online" list; the
/// agent-id ordering keeps iteration deterministic across snapshots.
#[must_use]
pub fn presence_roster(cache: &PresenceCache) -> Vec<PresenceView> {
    let mut views: Vec<PresenceView> = cache
        .snapshot()
        .into_iter()
        .map(|record| PresenceView {
            name: record.display_name().to_string(),
            display: to_display(record.position),
            agent_id: record.agent_id,
            position: record.position,
            current_action: record.current_action,
        })
        .collect();
    views.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
    views
}
