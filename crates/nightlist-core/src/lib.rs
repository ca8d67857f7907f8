//! NightList Core - identity-keyed list diffing kernel
//!
//! This crate provides the synchronous foundation of NightList:
//! - Records, display items and validated sequences with a header row
//! - A deterministic, minimal diff engine producing edit scripts
//! - Sequential list updates for consumers that apply one change at a time
//! - The reference apply function for edit scripts
//! - The canonical error facility and structured logging

pub mod apply;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;

#[doc(hidden)]
pub use nightlist_core_types as __core_types;

// Re-export commonly used types
pub use apply::{apply_edit_script, apply_list_update, replay_list_updates};
pub use diff::{
    compute_diff, compute_diff_with, diff_items, render_human_summary, DiffConfig, DiffStats,
    EditOp, EditScript, ListUpdate, MoveDetection,
};
pub use errors::{DiffError, ExError, ExErrorKind, Result};
pub use model::{DisplayItem, HeaderPolicy, ItemKind, Record, Sequence, SleepNight, Snapshot};
