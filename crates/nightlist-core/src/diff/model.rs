//! Edit script types.
//!
//! ## Coordinate space
//!
//! - `Remove::position` and `Move::from` address the **old** sequence.
//! - `Insert::position`, `Move::to` and `Change::position` address the **new**
//!   sequence.
//!
//! Applying a script vacates every old position named by a remove or a move
//! source, places inserted and moved items at their new positions, fills the
//! remaining new positions in order with the retained old items, then replaces
//! the item at every changed position. See [`crate::apply::apply_edit_script`].

use serde::{Deserialize, Serialize};

use crate::model::DisplayItem;

/// One operation of an edit script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp<R> {
    /// Insert `item` at new position `position`
    Insert {
        position: usize,
        item: DisplayItem<R>,
    },
    /// Remove the item at old position `position`
    Remove { position: usize },
    /// Move the item at old position `from` to new position `to`
    Move { from: usize, to: usize },
    /// Replace the content of the item at new position `position`
    Change {
        position: usize,
        item: DisplayItem<R>,
    },
}

/// Ordered list of operations turning one sequence into another
///
/// Operations are emitted removes first (ascending), then moves (ascending by
/// target), inserts (ascending) and changes (ascending).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditScript<R> {
    source_len: usize,
    target_len: usize,
    ops: Vec<EditOp<R>>,
}

impl<R> EditScript<R> {
    /// Script that leaves a sequence of `len` items untouched
    pub fn empty(len: usize) -> Self {
        Self {
            source_len: len,
            target_len: len,
            ops: Vec::new(),
        }
    }

    /// Build a script from operations for a source of `source_len` items
    ///
    /// The target length is derived from the operations; whether they fit the
    /// source is checked when the script is applied.
    pub fn from_ops(source_len: usize, ops: Vec<EditOp<R>>) -> Self {
        let mut inserts = 0usize;
        let mut removes = 0usize;
        for op in &ops {
            match op {
                EditOp::Insert { .. } => inserts += 1,
                EditOp::Remove { .. } => removes += 1,
                EditOp::Move { .. } | EditOp::Change { .. } => {}
            }
        }
        Self {
            source_len,
            target_len: (source_len + inserts).saturating_sub(removes),
            ops,
        }
    }

    pub fn ops(&self) -> &[EditOp<R>] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<EditOp<R>> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Length of the sequence this script applies to
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Length of the sequence this script produces
    pub fn target_len(&self) -> usize {
        self.target_len
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for op in &self.ops {
            match op {
                EditOp::Insert { .. } => stats.inserts += 1,
                EditOp::Remove { .. } => stats.removes += 1,
                EditOp::Move { .. } => stats.moves += 1,
                EditOp::Change { .. } => stats.changes += 1,
            }
        }
        stats
    }
}

/// Operation counts of an edit script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub inserts: usize,
    pub removes: usize,
    pub moves: usize,
    pub changes: usize,
}

impl DiffStats {
    pub fn total(&self) -> usize {
        self.inserts + self.removes + self.moves + self.changes
    }
}

/// How a matched item that left the common subsequence is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDetection {
    /// As a single `Move` (plus a `Change` if its content differs)
    #[default]
    Explicit,
    /// As a `Remove` at the old position and an `Insert` at the new one
    RemoveInsert,
}

/// Diff engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffConfig {
    pub moves: MoveDetection,
}

/// One sequential list notification
///
/// Unlike [`EditOp`], each position is relative to the list as left by all
/// preceding updates, so a consumer can apply them one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "update", rename_all = "snake_case")]
pub enum ListUpdate {
    Removed { position: usize },
    Moved { from: usize, to: usize },
    Inserted { position: usize },
    Changed { position: usize },
}
