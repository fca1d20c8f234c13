//! Room message records and snapshot identity.
//!
//! DESIGN
//! ======
//! A snapshot is the full ordered message array returned by one fetch.
//! Change detection compares the ordered id lists structurally, so an
//! equal-by-value copy of a snapshot is never treated as new and ids
//! containing arbitrary characters cannot collide.

use serde::{Deserialize, Serialize};

// =============================================================================
// MESSAGE
// =============================================================================

/// A single chat message as served by `GET /messages/{room_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub user_name: String,
    pub user_id: String,
    /// Unix seconds.
    pub created_at: i64,
}

impl Message {
    /// Creation time in unix milliseconds.
    #[must_use]
    pub fn created_at_ms(&self) -> i64 {
        self.created_at.saturating_mul(1000)
    }
}

// =============================================================================
// SNAPSHOT KEY
// =============================================================================

/// Ordered id sequence identifying a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SnapshotKey(Vec<String>);

impl SnapshotKey {
    #[must_use]
    pub fn of(snapshot: &[Message]) -> Self {
        Self(snapshot.iter().map(|m| m.id.clone()).collect())
    }

    /// True when `snapshot` has exactly this id sequence.
    #[must_use]
    pub fn matches(&self, snapshot: &[Message]) -> bool {
        self.0.len() == snapshot.len() && self.0.iter().zip(snapshot).all(|(id, m)| *id == m.id)
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
