//! NightList Engine - Update coordination layer
//!
//! Runs the diff engine off the consumer's thread and hands edit scripts back
//! to the consumer in submission order, with cancellation on teardown.

pub mod config;
pub mod consumer;
pub mod coordinator;
pub mod events;
pub mod source;

pub use config::{CoordinatorConfig, SubmissionPolicy};
pub use consumer::{
    AppliedCycle, ConsumerPort, ListConsumer, MirrorConsumer, NoopBinder, RowBinder,
};
pub use coordinator::{Submitter, UpdateCoordinator};
pub use events::CoordinatorEvent;
pub use source::{SnapshotSource, WatchSource};
