//! Structured logging facility
//!
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use tally_core::logging_facility::{init, Profile};
//!
//! // Initialize once at application startup
//! init(Profile::Development);
//! ```
//!
//! Every public engine operation brackets itself with exactly one start
//! event and exactly one end (or end_error) event.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use tally_core_types::schema;
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
