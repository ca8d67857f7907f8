//! Sequence diff engine.
//!
//! Compares two validated sequences and produces the edit script that turns
//! the first into the second.
//!
//! ## Entry point
//!
//! ```
//! use nightlist_core::diff::{compute_diff, render_human_summary};
//! use nightlist_core::model::{HeaderPolicy, Sequence, SleepNight};
//!
//! let old = Sequence::from_snapshot(Some(vec![SleepNight::started(1, 0)]), HeaderPolicy::Always)?;
//! let new = Sequence::from_snapshot(
//!     Some(vec![SleepNight::started(2, 10), SleepNight::started(1, 0)]),
//!     HeaderPolicy::Always,
//! )?;
//! let script = compute_diff(&old, &new);
//! assert_eq!(script.stats().inserts, 1);
//! println!("{}", render_human_summary(&script));
//! # Ok::<(), nightlist_core::ExError>(())
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: equal inputs produce equal scripts.
//! - **Minimality**: nothing on the identity common subsequence moves, and no
//!   `Change` is emitted between content-equal items.
//! - **Round-trip**: applying the script, or replaying its list updates, on the
//!   old sequence yields the new one.

mod alignment;
pub mod engine;
pub mod human_summary;
mod layout;
mod list_updates;
pub mod model;

pub use engine::{compute_diff, compute_diff_with, diff_items};
pub use human_summary::render_human_summary;
pub use model::{DiffConfig, DiffStats, EditOp, EditScript, ListUpdate, MoveDetection};

pub(crate) use layout::{resolve, Slot};
