// Integration tests for the in-memory document store
// Covers subscriptions, fault injection and seed loading

use std::path::PathBuf;
use std::time::Duration;

use tally_core::model::Fields;
use tally_core::store::{FieldValue, Filter, Query, WriteFields};
use tally_core::{RemoteStore, StoreError, StoreErrorCode};
use tally_store::seed::{parse_seed_file, parse_seed_str};
use tally_store::{Fault, MemoryStore, StoreOp};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn added_now() -> WriteFields {
    let mut fields = WriteFields::new();
    fields.insert("addedAt".to_string(), FieldValue::ServerTimestamp);
    fields
}

fn ids(docs: &[tally_core::Document]) -> Vec<String> {
    docs.iter().map(|d| d.id.clone()).collect()
}

#[tokio::test]
async fn test_subscription_delivers_initial_then_full_snapshots() {
    // Given: A wishlist collection with one entry
    let store = MemoryStore::new();
    store.insert_document("users/u1/wishlist", "g1", Fields::new());

    // When: We subscribe and then write twice
    let mut sub = store
        .subscribe("users/u1/wishlist", &Query::new())
        .await
        .unwrap();
    store
        .set("users/u1/wishlist", "g2", added_now())
        .await
        .unwrap();
    store.delete("users/u1/wishlist", "g1").await.unwrap();

    // Then: Every snapshot is the entire current set, in write order
    assert_eq!(ids(&sub.next().await.unwrap()), vec!["g1"]);
    assert_eq!(ids(&sub.next().await.unwrap()), vec!["g1", "g2"]);
    assert_eq!(ids(&sub.next().await.unwrap()), vec!["g2"]);
}

#[tokio::test]
async fn test_subscription_sees_only_its_collection() {
    // Given: Subscriptions on two users' wishlists
    let store = MemoryStore::new();
    let mut u1 = store
        .subscribe("users/u1/wishlist", &Query::new())
        .await
        .unwrap();
    let mut u2 = store
        .subscribe("users/u2/wishlist", &Query::new())
        .await
        .unwrap();
    assert!(u1.next().await.unwrap().is_empty());
    assert!(u2.next().await.unwrap().is_empty());

    // When: Only u1's wishlist changes
    store
        .set("users/u1/wishlist", "g1", added_now())
        .await
        .unwrap();

    // Then: u2 receives nothing
    assert_eq!(ids(&u1.next().await.unwrap()), vec!["g1"]);
    assert!(u2.latest().is_none());
}

#[tokio::test]
async fn test_deleting_missing_document_is_silent() {
    // Given: A live subscription on an empty collection
    let store = MemoryStore::new();
    let mut sub = store.subscribe("items", &Query::new()).await.unwrap();
    sub.next().await.unwrap();

    // When: A document that never existed is deleted
    let result = store.delete("items", "ghost").await;

    // Then: The call succeeds and no snapshot is pushed
    assert!(result.is_ok());
    assert!(sub.latest().is_none());
}

#[tokio::test]
async fn test_cancelled_subscription_stops_delivery() {
    // Given: A subscription that has been cancelled
    let store = MemoryStore::new();
    let sub = store.subscribe("items", &Query::new()).await.unwrap();
    assert_eq!(store.listener_count("items"), 1);
    sub.cancel();

    // When: The collection changes
    store.insert_document("items", "g1", Fields::new());

    // Then: The store no longer holds the listener
    assert_eq!(store.listener_count("items"), 0);
}

#[tokio::test]
async fn test_fault_targets_one_document() {
    // Given: Updates to item b fail
    let store = MemoryStore::new();
    for id in ["a", "b"] {
        store.insert_document("items", id, Fields::new());
    }
    store.inject_fault(
        Fault::fail(StoreOp::Update, StoreError::unavailable("backend down"))
            .in_collection("items")
            .on_document("b"),
    );
    let mut patch = WriteFields::new();
    patch.insert("aggregateCount".to_string(), FieldValue::from(1u64));

    // When: Both items are updated
    let a = store.update("items", "a", patch.clone()).await;
    let b = store.update("items", "b", patch).await;

    // Then: Only b fails, with the injected code, and both calls are counted
    assert!(a.is_ok());
    assert_eq!(b.unwrap_err().code, StoreErrorCode::Unavailable);
    assert_eq!(store.op_count(StoreOp::Update), 2);
    assert!(store.document("items", "b").unwrap().get("aggregateCount").is_none());
}

#[tokio::test]
async fn test_delay_fault_holds_call_then_proceeds() {
    // Given: Reads of the items collection are delayed
    let store = MemoryStore::new();
    store.insert_document("items", "g1", Fields::new().with("title", "Hades"));
    store.inject_fault(Fault::delay(StoreOp::Get, Duration::from_millis(20)).times(1));

    // When: The document is read
    let started = std::time::Instant::now();
    let doc = store.get("items", "g1").await.unwrap();

    // Then: It arrives after the delay
    assert!(started.elapsed() >= Duration::from_millis(20));
    assert_eq!(doc.unwrap().fields.get_str("title"), Some("Hades"));
}

#[tokio::test]
async fn test_query_orders_and_limits() {
    // Given: Items with aggregate scores, one without
    let store = MemoryStore::new();
    store.insert_document("items", "g1", Fields::new().with("aggregateScore", 3.5));
    store.insert_document("items", "g2", Fields::new().with("aggregateScore", 4.5));
    store.insert_document("items", "g3", Fields::new().with("aggregateScore", 1.0));
    store.insert_document("items", "g4", Fields::new());

    // When: Top two by score are requested
    let q = Query::new().order_by("aggregateScore", true).limit(2);
    let docs = store.query("items", &q).await.unwrap();

    // Then: Highest first; the unscored item never appears
    assert_eq!(ids(&docs), vec!["g2", "g1"]);
}

#[tokio::test]
async fn test_in_filter_by_document_id() {
    let store = MemoryStore::new();
    for id in ["a", "b", "c"] {
        store.insert_document("items", id, Fields::new());
    }
    let q = Query::new().filter(Filter::id_in(["c", "a", "zz"]));
    let docs = store.query("items", &q).await.unwrap();
    assert_eq!(ids(&docs), vec!["a", "c"]);
}

#[test]
fn test_load_seed_fixture() {
    // Given: The catalog seed fixture
    let seed = parse_seed_file(&fixtures_dir().join("seed_catalog.json")).unwrap();

    // When: It is loaded into a fresh store
    let store = MemoryStore::from_seed(seed);

    // Then: Every collection is populated
    assert_eq!(store.collection_len("items"), 2);
    assert_eq!(store.collection_len("reviews"), 1);
    assert_eq!(store.collection_len("users/u1/wishlist"), 1);
    assert_eq!(
        store.document("reviews", "r1").unwrap().get_str("itemId"),
        Some("g1")
    );
}

#[test]
fn test_seed_file_written_at_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed.json");
    std::fs::write(&path, r#"{ "items": { "x": { "title": "X" } } }"#).unwrap();

    let seed = parse_seed_file(&path).unwrap();
    let store = MemoryStore::new();
    assert_eq!(store.load_seed(seed), 1);
}

#[test]
fn test_missing_seed_file_is_invalid_input() {
    let err = parse_seed_file(&fixtures_dir().join("nope.json")).unwrap_err();
    assert!(matches!(err, tally_core::TallyError::InvalidInput { .. }));
    assert!(parse_seed_str("[]").is_err());
}
