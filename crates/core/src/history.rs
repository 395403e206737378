//! Linear edit history for one editing session.
//!
//! The history is seeded with the tune's current ABC body and is never empty.
//! Undo pops the newest snapshot; an edit after an undo discards the popped
//! branch for good (there is no redo).

use serde::Serialize;

/// Minimum number of snapshots required before undo is possible.
const MIN_UNDO_LEN: usize = 2;

/// Ordered ABC snapshots, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditHistory {
    snapshots: Vec<String>,
}

impl EditHistory {
    /// Start a history holding exactly `seed`.
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            snapshots: vec![seed.into()],
        }
    }

    /// Append a snapshot. Always succeeds.
    pub fn append(&mut self, snapshot: impl Into<String>) {
        self.snapshots.push(snapshot.into());
    }

    /// Whether [`undo`](Self::undo) would change anything.
    pub fn can_undo(&self) -> bool {
        self.snapshots.len() >= MIN_UNDO_LEN
    }

    /// Drop the newest snapshot and return it.
    ///
    /// Returns `None` without touching the history when undo is disabled, so
    /// the seed can never be removed.
    pub fn undo(&mut self) -> Option<String> {
        if !self.can_undo() {
            return None;
        }
        self.snapshots.pop()
    }

    /// The newest snapshot.
    pub fn latest(&self) -> &str {
        // The seed is never popped, so the vector is never empty.
        self.snapshots.last().map(String::as_str).unwrap_or_default()
    }

    /// Number of snapshots, including the seed.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always `false`; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
