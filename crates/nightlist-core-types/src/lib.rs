//! Core types shared across NightList facilities
//!
//! This crate provides foundational types used by the error, logging and
//! coordination layers:
//!
//! - **Correlation types**: CycleId, SubmissionId, CycleContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{CycleContext, CycleId, SubmissionId};
