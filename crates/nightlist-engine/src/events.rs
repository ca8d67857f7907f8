//! Coordinator event stream.

use nightlist_core::{DiffStats, ExError};
use nightlist_core_types::{CycleId, SubmissionId};

/// Outcome of a submission, published on the coordinator's broadcast channel
///
/// Every accepted submission ends in exactly one of `Applied`, `Coalesced`,
/// `Superseded`, `Failed` or `Discarded`. `Stopped` is published once, last.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// The consumer applied the script and the target became the baseline
    Applied {
        submission: SubmissionId,
        cycle_id: CycleId,
        stats: DiffStats,
        /// Item count of the new baseline
        item_count: usize,
    },
    /// Replaced by a newer waiting snapshot before its diff started
    Coalesced {
        submission: SubmissionId,
        into: SubmissionId,
    },
    /// Result dropped because a newer snapshot arrived while it was computing
    Superseded {
        submission: SubmissionId,
        by: SubmissionId,
    },
    /// The snapshot was malformed or the diff faulted; the baseline is kept
    Failed {
        submission: SubmissionId,
        cycle_id: CycleId,
        error: ExError,
    },
    /// Dropped because the coordinator or its consumer was torn down
    Discarded { submission: SubmissionId },
    /// The driver has exited
    Stopped,
}

impl CoordinatorEvent {
    /// Submission this event reports on; `None` for `Stopped`
    pub fn submission(&self) -> Option<SubmissionId> {
        match self {
            CoordinatorEvent::Applied { submission, .. }
            | CoordinatorEvent::Coalesced { submission, .. }
            | CoordinatorEvent::Superseded { submission, .. }
            | CoordinatorEvent::Failed { submission, .. }
            | CoordinatorEvent::Discarded { submission } => Some(*submission),
            CoordinatorEvent::Stopped => None,
        }
    }

    /// Check if this event ends its submission with the target applied
    pub fn is_applied(&self) -> bool {
        matches!(self, CoordinatorEvent::Applied { .. })
    }
}
