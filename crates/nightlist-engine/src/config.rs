//! Coordinator configuration
//!
//! Every key is optional; a missing key takes its default.
//!
//! ```toml
//! header = "always"          # always | when_non_empty | never
//! moves = "explicit"         # explicit | remove_insert
//! submission = "latest"      # queue | latest | supersede
//! supersede_limit = 3        # supersede only: results dropped in a row before one is handed off
//! event_capacity = 64
//! ```

use nightlist_core::{DiffConfig, ExError, ExErrorKind, HeaderPolicy, MoveDetection, Result};
use serde::{Deserialize, Serialize};

const OP_LOAD_CONFIG: &str = "load_config";

/// What happens to snapshots submitted while a cycle is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPolicy {
    /// Diff and apply every snapshot, in submission order
    Queue,
    /// Hand off every finished result; waiting snapshots collapse to the newest
    #[default]
    Latest,
    /// Like `Latest`, but a finished result is dropped when a newer snapshot
    /// arrived while it was computing, at most `supersede_limit` times in a row
    Supersede,
}

/// Configuration of one update coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Header row placement when wrapping snapshots
    pub header: HeaderPolicy,
    /// How moved items are reported in edit scripts
    pub moves: MoveDetection,
    pub submission: SubmissionPolicy,
    /// Consecutive results `Supersede` may drop; the next one is handed off
    pub supersede_limit: u32,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            header: HeaderPolicy::Always,
            moves: MoveDetection::Explicit,
            submission: SubmissionPolicy::Latest,
            supersede_limit: 3,
            event_capacity: 64,
        }
    }
}

impl CoordinatorConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// `Configuration` when the document does not parse, names an unknown key
    /// or fails [`CoordinatorConfig::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| {
            ExError::new(ExErrorKind::Configuration)
                .with_op(OP_LOAD_CONFIG)
                .with_message(e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// `Configuration` when `event_capacity` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(ExError::new(ExErrorKind::Configuration)
                .with_op(OP_LOAD_CONFIG)
                .with_message("event_capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn diff_config(&self) -> DiffConfig {
        DiffConfig { moves: self.moves }
    }
}
