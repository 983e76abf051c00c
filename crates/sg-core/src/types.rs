//! Core types for the garden sync engine
//!
//! Defines the entities the synchronization core works over:
//! - Identifiers for gardens, agents, and chat messages
//! - Chat messages as they appear on the wire and in the cache
//! - Agent presence records and spatial positions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name substituted while an agent's real name is unresolved
pub const UNKNOWN_SPIRIT: &str = "Unknown Spirit";

/// Lower navmesh bound on the x and z axes
pub const WORLD_MIN: f64 = -50.0;

/// Upper navmesh bound on the x and z axes
pub const WORLD_MAX: f64 = 50.0;

/// Garden scope identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GardenId(pub String);

impl GardenId {
    /// The default garden every client lands in
    #[inline]
    #[must_use]
    pub fn main() -> Self {
        Self("main".to_string())
    }

    /// View as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GardenId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for GardenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Agent identifier as issued by the backing store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    /// View as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat message identifier
///
/// Client-generated (v4 UUID) for optimistic entries; the same id becomes
/// authoritative once the write is confirmed through the change feed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a fresh locally-unique id
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One chat message, unique by id within a garden scope
///
/// Messages are created once (optimistically on the client or
/// authoritatively by the store) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message id
    pub id: MessageId,
    /// Garden this message belongs to
    pub garden_id: GardenId,
    /// Sender id ("user" for the local author)
    pub sender_id: String,
    /// Sender display name, denormalized at write time
    pub sender_name: String,
    /// Message text
    pub content: String,
    /// Creation timestamp (wall clock at the writer)
    pub created_at: DateTime<Utc>,
}

/// 3-axis spatial position within the garden
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// East-west axis
    pub x: f64,
    /// Elevation
    pub y: f64,
    /// North-south axis
    pub z: f64,
}

impl Position {
    /// Create a position
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The garden origin
    #[inline]
    #[must_use]
    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Live presence of one agent
///
/// At most one record exists per agent id; absence means "not present."
/// Records are driven entirely by the change feed — the local client never
/// creates them speculatively.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceRecord {
    /// Agent this record belongs to
    pub agent_id: AgentId,
    /// Resolved display name; `None` until the roster or a point lookup
    /// supplies one
    pub name: Option<String>,
    /// Current position in the garden
    pub position: Position,
    /// Free-form activity label ("idle", "Tending the ferns", ...)
    pub current_action: String,
}

impl PresenceRecord {
    /// Display name, substituting the sentinel while unresolved
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_SPIRIT)
    }
}

/// Presence row as it crosses the store boundary
///
/// The feed delivers loosely-typed rows; this is the fixed shape they must
/// validate into before touching the cache. All fields are required —
/// malformed rows are rejected at intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRow {
    /// Agent id (row key)
    pub agent_id: AgentId,
    /// Spatial position
    pub position: Position,
    /// Activity label
    pub current_action: String,
}

impl PresenceRow {
    /// Lift a validated row into a cache record with the given name
    #[inline]
    #[must_use]
    pub fn into_record(self, name: Option<String>) -> PresenceRecord {
        PresenceRecord {
            agent_id: self.agent_id,
            name,
            position: self.position,
            current_action: self.current_action,
        }
    }
}

/// Roster row from the agent table (id and display name only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRow {
    /// Agent id
    pub id: AgentId,
    /// Display name
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn message_id_generation_is_unique() {
        let a = MessageId::generate();
        let b = MessageId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn garden_id_serde_is_transparent() {
        let id = GardenId::main();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"main\"");
    }

    #[test]
    fn chat_message_round_trips_through_json() {
        let msg = ChatMessage {
            id: MessageId::from("m1"),
            garden_id: GardenId::main(),
            sender_id: "user".to_string(),
            sender_name: "Dana".to_string(),
            content: "hello garden".to_string(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        let back: ChatMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn presence_row_requires_all_fields() {
        let missing_position = serde_json::json!({
            "agent_id": "x",
            "current_action": "idle",
        });
        assert!(serde_json::from_value::<PresenceRow>(missing_position).is_err());
    }

    #[test]
    fn display_name_falls_back_to_sentinel() {
        let record = PresenceRecord {
            agent_id: AgentId::from("x"),
            name: None,
            position: Position::origin(),
            current_action: "idle".to_string(),
        };
        assert_eq!(record.display_name(), UNKNOWN_SPIRIT);
    }
}
