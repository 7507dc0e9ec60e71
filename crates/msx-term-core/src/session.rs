//! Session types for terminal session management.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a terminal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a terminal session.
///
/// A session moves `Running → Stopping` when the user exits, the transport
/// fails, or an external stop is requested, and `Stopping → Stopped` once
/// both loops have observed the stop signal and the transport is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Both loops are active
    Running,
    /// Stop signal raised, loops winding down
    Stopping,
    /// Loops exited and transport released
    Stopped,
}

/// Stream processing strategy for received data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Display every received character immediately (production default)
    Instant,
    /// Accumulate and emit whole lines once a prompt is seen (legacy path)
    Buffered,
}

impl Default for ProcessingMode {
    fn default() -> Self {
        Self::Instant
    }
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Instant => "instant",
            Self::Buffered => "buffered",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_creation() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2); // Should generate different IDs
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new();
        let display = format!("{id}");
        assert!(!display.is_empty());
        assert_eq!(display.len(), 36); // UUID format length
    }

    #[test]
    fn test_session_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = SessionId::from(uuid);
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn test_session_status_equality() {
        assert_eq!(SessionStatus::Running, SessionStatus::Running);
        assert_ne!(SessionStatus::Running, SessionStatus::Stopped);
    }

    #[test]
    fn test_processing_mode_default() {
        assert_eq!(ProcessingMode::default(), ProcessingMode::Instant);
    }

    #[test]
    fn test_processing_mode_serde() {
        let json = serde_json::to_string(&ProcessingMode::Buffered).unwrap();
        assert_eq!(json, "\"buffered\"");

        let mode: ProcessingMode = serde_json::from_str("\"instant\"").unwrap();
        assert_eq!(mode, ProcessingMode::Instant);
    }

    #[test]
    fn test_processing_mode_display() {
        assert_eq!(ProcessingMode::Instant.to_string(), "instant");
        assert_eq!(ProcessingMode::Buffered.to_string(), "buffered");
    }
}
