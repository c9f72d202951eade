//! Engine operations
//!
//! Each public operation is bracketed by the canonical start/end log events
//! and tagged with a fresh request id.

pub mod backfill;
pub mod batch_fetch;
pub mod catalog;
pub mod reviews;
pub mod wishlist;

use std::time::Instant;

use tally_core::{log_op_end, log_op_error, Result};
use tally_core_types::RequestId;

/// Emit the end event for `op`, successful or not, and hand the result back
pub(crate) fn finish<T>(
    op: &'static str,
    request_id: &RequestId,
    started: Instant,
    result: Result<T>,
) -> Result<T> {
    let duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => {
            log_op_end!(op, duration_ms = duration_ms, request_id = %request_id);
        }
        Err(err) => {
            log_op_error!(op, err, duration_ms = duration_ms, request_id = %request_id);
        }
    }
    result
}
