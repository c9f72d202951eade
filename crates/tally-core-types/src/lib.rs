//! Core types shared across the tally crates
//!
//! - **Correlation types**: `RequestId` stamped on every engine operation
//! - **Schema constants**: canonical structured-log field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::RequestId;
