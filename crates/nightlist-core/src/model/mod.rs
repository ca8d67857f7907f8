//! Item model: records, display items and sequences.

pub mod item;
pub mod record;
pub mod sequence;

pub use item::{DisplayItem, ItemKind, HEADER_ID};
pub use record::{Record, SleepNight, UNRATED_QUALITY};
pub use sequence::{HeaderPolicy, Sequence, Snapshot};
