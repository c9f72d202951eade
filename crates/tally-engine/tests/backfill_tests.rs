// Integration tests for the corpus-wide recompute job

mod common;

use common::{harness, seed_item, stored_aggregate};
use tally_core::logging_facility::schema::{EVENT_END, EVENT_ITEM};
use tally_core::logging_facility::test_capture::init_test_capture;
use tally_core::model::{collections, Fields};
use tally_core::{Aggregate, ExErrorKind, StoreError, TallyError};
use tally_store::{Fault, MemoryStore, StoreOp};

/// Write a review document directly, leaving the item aggregate stale
fn seed_review(store: &MemoryStore, id: &str, item_id: &str, author_id: &str, rating: f64) {
    store.insert_document(
        collections::REVIEWS,
        id,
        Fields::new()
            .with("itemId", item_id)
            .with("authorId", author_id)
            .with("rating", rating)
            .with("body", "seeded")
            .with("createdAt", "2025-11-01T10:00:00.000000Z"),
    );
}

#[tokio::test]
async fn test_backfill_repairs_every_item() {
    // GIVEN items whose stored aggregates are stale
    let h = harness();
    for id in ["a", "b", "c"] {
        seed_item(&h.store, id);
    }
    seed_review(&h.store, "r1", "a", "u1", 4.0);
    seed_review(&h.store, "r2", "a", "u2", 3.0);
    seed_review(&h.store, "r3", "c", "u1", 1.5);

    // WHEN the backfill runs
    let report = h.backfill.recompute_all().await.unwrap();

    // THEN every item carries the aggregate of its reviews
    assert_eq!(report.attempted(), 3);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(stored_aggregate(&h.store, "a"), Aggregate::new(3.5, 2));
    assert_eq!(stored_aggregate(&h.store, "b"), Aggregate::new(0.0, 0));
    assert_eq!(stored_aggregate(&h.store, "c"), Aggregate::new(1.5, 1));
}

#[tokio::test]
async fn test_backfill_isolates_failing_item() {
    // GIVEN items a, b, c where writing b's aggregate fails
    let h = harness();
    for id in ["a", "b", "c"] {
        seed_item(&h.store, id);
    }
    seed_review(&h.store, "r1", "a", "u1", 4.0);
    seed_review(&h.store, "r2", "b", "u1", 2.0);
    seed_review(&h.store, "r3", "c", "u1", 5.0);
    h.store.inject_fault(
        Fault::fail(StoreOp::Update, StoreError::unavailable("b is cursed"))
            .in_collection(collections::ITEMS)
            .on_document("b"),
    );

    // WHEN the backfill runs
    let report = h.backfill.recompute_all().await.unwrap();

    // THEN a and c are recomputed and b's failure is reported, not raised
    assert_eq!(report.attempted(), 3);
    assert_eq!(report.succeeded(), 2);
    let failed: Vec<&str> = report.failures().map(|o| o.item_id.as_str()).collect();
    assert_eq!(failed, vec!["b"]);
    assert_eq!(
        report.outcome("b").unwrap().result,
        Err(TallyError::Remote(StoreError::unavailable("b is cursed")))
    );
    assert_eq!(stored_aggregate(&h.store, "a"), Aggregate::new(4.0, 1));
    assert_eq!(stored_aggregate(&h.store, "b"), Aggregate::new(0.0, 0));
    assert_eq!(stored_aggregate(&h.store, "c"), Aggregate::new(5.0, 1));
}

#[tokio::test]
async fn test_backfill_fails_only_when_listing_fails() {
    let h = harness();
    seed_item(&h.store, "a");
    h.store.inject_fault(
        Fault::fail(StoreOp::Query, StoreError::unavailable("offline"))
            .in_collection(collections::ITEMS),
    );

    let err = h.backfill.recompute_all().await.unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::RemoteFailure);
}

#[tokio::test]
async fn test_backfill_writes_unrounded_mean() {
    let h = harness();
    seed_item(&h.store, "a");
    seed_review(&h.store, "r1", "a", "u1", 4.0);
    seed_review(&h.store, "r2", "a", "u2", 4.0);
    seed_review(&h.store, "r3", "a", "u3", 5.0);

    h.backfill.recompute_all().await.unwrap();

    let stored = stored_aggregate(&h.store, "a");
    assert_eq!(stored.count, 3);
    assert_eq!(stored.score, 13.0 / 3.0);
}

#[tokio::test]
async fn test_backfill_logs_one_event_per_item() {
    // GIVEN log capture and two uniquely named items, one failing
    let capture = init_test_capture();
    let h = harness();
    seed_item(&h.store, "log-ok");
    seed_item(&h.store, "log-bad");
    h.store.inject_fault(
        Fault::fail(StoreOp::Update, StoreError::unavailable("nope")).on_document("log-bad"),
    );

    // WHEN the backfill runs
    h.backfill.recompute_all().await.unwrap();

    // THEN each item has its own event, the failure carrying its code
    let events = capture.events_for_op("recompute_all");
    let item_event = |id: &str| {
        events
            .iter()
            .find(|e| e.event.as_deref() == Some(EVENT_ITEM) && e.field("item_id") == Some(id))
            .cloned()
    };
    let ok = item_event("log-ok").expect("event for log-ok");
    assert_eq!(ok.field("aggregate_count"), Some("0"));
    let bad = item_event("log-bad").expect("event for log-bad");
    assert_eq!(bad.field("err.code"), Some("ERR_REMOTE_FAILURE"));
    assert_eq!(bad.level, tracing::Level::WARN);

    // AND the job itself ends successfully
    assert!(events.iter().any(|e| e.event.as_deref() == Some(EVENT_END)));
}
