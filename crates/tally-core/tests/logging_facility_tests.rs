#![allow(clippy::unwrap_used, clippy::expect_used)]

use tally_core::errors::{StoreError, TallyError};
use tally_core::logging_facility::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use tally_core::logging_facility::test_capture::init_test_capture;
use tally_core::{log_op_end, log_op_error, log_op_start};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .collect();

    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = TallyError::DuplicateSubmission {
        item_id: "g1".to_string(),
        author_id: "u1".to_string(),
    };
    log_op_error!(op_name, &err, duration_ms = 10);

    let events = capture.events_for_op(op_name);
    let error_event = events
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("Should have error event");

    assert_eq!(
        error_event.field("err.code"),
        Some("ERR_DUPLICATE_SUBMISSION")
    );
    assert_eq!(error_event.level, tracing::Level::ERROR);
}

#[test]
fn test_remote_error_logs_remote_code_and_message() {
    let capture = init_test_capture();
    let op_name = "test_remote_error_unique_4";

    let err = TallyError::Remote(StoreError::unavailable("backend offline"));
    log_op_error!(op_name, err, duration_ms = 1, item_id = "g9");

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].field("err.code"), Some("ERR_REMOTE_FAILURE"));
    assert_eq!(events[0].field("message"), Some("backend offline"));
    assert_eq!(events[0].field("item_id"), Some("g9"));
}

#[test]
fn test_boundary_single_start_end() {
    let capture = init_test_capture();
    let op_name = "test_boundary_unique_5";

    log_op_start!(op_name, item_id = "g1");
    log_op_end!(op_name, duration_ms = 3, aggregate_count = 2u64);

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)
    });
    let ends = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END)
    });

    assert_eq!(starts, 1);
    assert_eq!(ends, 1);
    let end = capture
        .events_for_op(op_name)
        .into_iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END))
        .unwrap();
    assert_eq!(end.field("aggregate_count"), Some("2"));
    assert!(end
        .component
        .as_deref()
        .unwrap()
        .contains("logging_facility_tests"));
}
