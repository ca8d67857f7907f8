//! Correlation types for update-cycle tracking
//!
//! A submitted snapshot is identified by its [`SubmissionId`]; the diff and
//! hand-off round that processes it is identified by a [`CycleId`]. Both are
//! carried in log events so one cycle can be followed across the background
//! worker and the consumer thread.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single update cycle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(String);

impl CycleId {
    /// Generate a new random CycleId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic position of a snapshot in a coordinator's submission order
///
/// Ids start at 1 and increase by one per accepted submission, so comparing
/// two ids tells which snapshot was submitted later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionId(u64);

impl SubmissionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Context carried through one update cycle for correlation
#[derive(Debug, Clone)]
pub struct CycleContext {
    pub cycle_id: CycleId,
    pub submission: SubmissionId,
}

impl CycleContext {
    /// Create a context with a fresh CycleId for the given submission
    pub fn new(submission: SubmissionId) -> Self {
        Self {
            cycle_id: CycleId::new(),
            submission,
        }
    }
}
