//! Progressive reveal of fetched snapshots.
//!
//! DESIGN
//! ======
//! A new snapshot is not shown all at once. The first
//! `initial_display_count` messages appear immediately, then the owner's
//! timer calls [`RevealState::tick`] once per display delay to append one
//! more message, in array order, until the snapshot is settled.
//!
//! ```text
//! Empty --observe(new ids)--> Seeding --> Revealing --tick*--> Settled
//!   ^                                        |                   |
//!   +------------observe(empty)--------------+-------------------+
//! ```
//!
//! A snapshot with a different id sequence always reseeds from its first
//! messages; there is no merge with an in-progress reveal. The state machine
//! owns no timer. Scheduling belongs to the caller (see `feed`).

use crate::message::{Message, SnapshotKey};

pub const INITIAL_DISPLAY_COUNT: usize = 10;
pub const BATCH_SIZE: usize = 15;

/// Reveal progress for the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No messages observed, or the server list emptied.
    Empty,
    /// Displayed set is a strict prefix; ticks still pending.
    Revealing,
    /// Displayed set equals the snapshot.
    Settled,
}

/// Outcome of [`RevealState::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotChange {
    /// Same id sequence as before. Nothing restarted.
    Unchanged,
    /// Server list emptied; everything cleared.
    Cleared,
    /// New id sequence; the first `shown` of `total` are displayed.
    Seeded { shown: usize, total: usize },
}

/// Reveal sizes. `Default` gives 10 up front and batches of 15.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealLimits {
    pub initial_display_count: usize,
    pub batch_size: usize,
}

impl Default for RevealLimits {
    fn default() -> Self {
        Self { initial_display_count: INITIAL_DISPLAY_COUNT, batch_size: BATCH_SIZE }
    }
}

// =============================================================================
// REVEAL STATE
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RevealState {
    limits: RevealLimits,
    key: SnapshotKey,
    all_messages: Vec<Message>,
    /// Next index of `all_messages` to reveal.
    display_index: usize,
    is_loading_more: bool,
}

impl RevealState {
    #[must_use]
    pub fn new(limits: RevealLimits) -> Self {
        Self { limits, ..Self::default() }
    }

    /// Compare a freshly fetched snapshot with the current one and reseed
    /// or clear as needed.
    pub fn observe(&mut self, snapshot: Vec<Message>) -> SnapshotChange {
        if snapshot.is_empty() {
            if self.all_messages.is_empty() {
                return SnapshotChange::Unchanged;
            }
            self.clear();
            return SnapshotChange::Cleared;
        }

        if self.key.matches(&snapshot) {
            return SnapshotChange::Unchanged;
        }

        let total = snapshot.len();
        let shown = total.min(self.limits.initial_display_count);
        self.key = SnapshotKey::of(&snapshot);
        self.all_messages = snapshot;
        self.display_index = shown;
        self.is_loading_more = false;
        SnapshotChange::Seeded { shown, total }
    }

    /// Reveal the next message. Returns false once settled.
    pub fn tick(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        self.display_index += 1;
        true
    }

    /// Start a manual batch extension. Returns false when there is nothing
    /// more to show or a batch is already in progress.
    pub fn begin_load_more(&mut self) -> bool {
        if !self.has_more() || self.is_loading_more {
            return false;
        }
        self.is_loading_more = true;
        true
    }

    /// Finish a batch started by [`Self::begin_load_more`]. No-op otherwise.
    pub fn complete_load_more(&mut self) {
        if !self.is_loading_more {
            return;
        }
        self.display_index = (self.display_index + self.limits.batch_size).min(self.all_messages.len());
        self.is_loading_more = false;
    }

    /// Extend the displayed set by one batch, bypassing the per-item delay.
    pub fn load_more(&mut self) -> bool {
        if !self.begin_load_more() {
            return false;
        }
        self.complete_load_more();
        true
    }

    /// Display the whole snapshot.
    pub fn show_all(&mut self) {
        self.display_index = self.all_messages.len();
        self.is_loading_more = false;
    }

    fn clear(&mut self) {
        self.key = SnapshotKey::default();
        self.all_messages.clear();
        self.display_index = 0;
        self.is_loading_more = false;
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Currently displayed prefix of the snapshot.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.all_messages[..self.display_index]
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.display_index < self.all_messages.len()
    }

    #[must_use]
    pub fn is_loading_more(&self) -> bool {
        self.is_loading_more
    }

    #[must_use]
    pub fn total_messages(&self) -> usize {
        self.all_messages.len()
    }

    #[must_use]
    pub fn displayed_count(&self) -> usize {
        self.display_index
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.all_messages.is_empty() {
            Phase::Empty
        } else if self.has_more() {
            Phase::Revealing
        } else {
            Phase::Settled
        }
    }
}

#[cfg(test)]
#[path = "reveal_test.rs"]
mod tests;
