//! Structured logging facility for NightList
//!
//! This module provides a canonical logging facility with:
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Correlation of update cycles through `cycle_id` / `submission` fields
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use nightlist_core::logging_facility::{init, Profile};
//!
//! # fn main() -> nightlist_core::Result<()> {
//! // Initialize once at application startup
//! init(Profile::Development)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Logging Macros
//!
//! - `log_op_start!(op, ...)` - Log operation start
//! - `log_op_end!(op, duration_ms = ...)` - Log operation end
//! - `log_op_error!(op, err, duration_ms = ...)` - Log operation error

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, CycleLog, TestCapture};
