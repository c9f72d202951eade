//! Canonical schema constants for structured logging
//!
//! These constants keep field keys consistent between the logging macros,
//! the engine operations and the test capture layer.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Entity identifiers
pub const FIELD_ITEM_ID: &str = "item_id";
pub const FIELD_REVIEW_ID: &str = "review_id";
pub const FIELD_USER_ID: &str = "user_id";

// Sizes and aggregates
pub const FIELD_ID_COUNT: &str = "id_count";
pub const FIELD_CHUNK_COUNT: &str = "chunk_count";
pub const FIELD_AGGREGATE_SCORE: &str = "aggregate_score";
pub const FIELD_AGGREGATE_COUNT: &str = "aggregate_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
/// Per-item outcome inside a long-running job (backfill)
pub const EVENT_ITEM: &str = "item";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_distinct() {
        let events = [EVENT_START, EVENT_END, EVENT_END_ERROR, EVENT_ITEM];
        for (i, a) in events.iter().enumerate() {
            for b in &events[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_error_fields_are_namespaced() {
        assert!(FIELD_ERR_KIND.starts_with("err."));
        assert!(FIELD_ERR_CODE.starts_with("err."));
    }
}
