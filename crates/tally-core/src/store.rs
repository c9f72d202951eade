//! Remote document store contract
//!
//! The engines never talk to a concrete backend; they are handed an
//! `Arc<dyn RemoteStore>` at construction time. Every operation is async
//! and independently failable. Subscriptions deliver the *entire* current
//! result set on every change, never a diff.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::mpsc;

use crate::errors::StoreError;
use crate::model::Document;

/// Pseudo field path addressing the document id in filters and ordering
pub const DOCUMENT_ID: &str = "__name__";

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Full result set delivered by a subscription
pub type Snapshot = Vec<Document>;

/// A value in a write: either literal JSON or a placeholder the store
/// resolves against its own clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Value(serde_json::Value),
    ServerTimestamp,
}

macro_rules! field_value_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    FieldValue::Value(value.into())
                }
            }
        )*
    };
}

field_value_from!(serde_json::Value, f64, u64, i64, bool, String, &str);

/// Field map for create/set/update
pub type WriteFields = BTreeMap<String, FieldValue>;

/// Single-field predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    Eq(String, serde_json::Value),
    Lt(String, serde_json::Value),
    Lte(String, serde_json::Value),
    Gt(String, serde_json::Value),
    Gte(String, serde_json::Value),
    /// Field value is one of a bounded set (see `RemoteStore::max_in_filter_len`)
    In(String, Vec<serde_json::Value>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Filter::Gte(field.into(), value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Filter::Lte(field.into(), value.into())
    }

    /// Document id is one of `ids`
    pub fn id_in<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::In(
            DOCUMENT_ID.to_string(),
            ids.into_iter()
                .map(|id| serde_json::Value::String(id.into()))
                .collect(),
        )
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(f, _)
            | Filter::Lt(f, _)
            | Filter::Lte(f, _)
            | Filter::Gt(f, _)
            | Filter::Gte(f, _)
            | Filter::In(f, _) => f,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// Filtered, ordered, optionally limited read of one collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.order.push(OrderBy {
            field: field.into(),
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Live query registration
///
/// Yields a full snapshot immediately and again after every change. The
/// registration is released by `cancel()` or by dropping the value; either
/// way the store stops delivering and frees its listener.
///
/// Snapshots may be produced on any thread; callers that drive a
/// single-threaded presentation context must hop onto it themselves.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Snapshot>,
    canceller: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a snapshot channel and the hook that unregisters it
    pub fn new(
        receiver: mpsc::UnboundedReceiver<Snapshot>,
        cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            canceller: Some(Box::new(cancel)),
        }
    }

    /// Wait for the next snapshot; `None` once the store closed the stream
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Newest snapshot already delivered, discarding older pending ones
    pub fn latest(&mut self) -> Option<Snapshot> {
        let mut newest = None;
        while let Ok(snapshot) = self.receiver.try_recv() {
            newest = Some(snapshot);
        }
        newest
    }

    /// Release the registration
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.canceller.take() {
            cancel();
            self.receiver.close();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.canceller.is_some())
            .finish()
    }
}

/// Remote document store client
///
/// Collections are slash-separated paths (`items`, `users/u1/wishlist`).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Largest value list an `In` filter may carry
    fn max_in_filter_len(&self) -> usize;

    /// Read one document; `Ok(None)` if it does not exist
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;

    /// Create a document with a store-assigned id and return that id
    async fn create(&self, collection: &str, data: WriteFields) -> StoreResult<String>;

    /// Create or replace the document at a caller-chosen id
    async fn set(&self, collection: &str, id: &str, data: WriteFields) -> StoreResult<()>;

    /// Merge `fields` into an existing document; fails with `NotFound` if absent
    async fn update(&self, collection: &str, id: &str, fields: WriteFields) -> StoreResult<()>;

    /// Delete a document; deleting a missing document succeeds
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    async fn subscribe(&self, collection: &str, query: &Query) -> StoreResult<Subscription>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_query_builder() {
        let q = Query::new()
            .filter(Filter::eq("itemId", "g1"))
            .order_by("createdAt", true)
            .limit(5);
        assert_eq!(q.filters, vec![Filter::Eq("itemId".into(), "g1".into())]);
        assert_eq!(q.order[0].field, "createdAt");
        assert!(q.order[0].descending);
        assert_eq!(q.limit, Some(5));
    }

    #[test]
    fn test_id_in_targets_document_id() {
        let f = Filter::id_in(["a", "b"]);
        assert_eq!(f.field(), DOCUMENT_ID);
        match f {
            Filter::In(_, values) => assert_eq!(values.len(), 2),
            other => panic!("unexpected filter {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_subscription_cancel_runs_hook_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let hook_calls = calls.clone();
        let mut sub = Subscription::new(rx, move || {
            hook_calls.fetch_add(1, Ordering::SeqCst);
        });

        tx.send(Vec::new()).unwrap();
        assert_eq!(sub.next().await, Some(Vec::new()));

        sub.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropping_subscription_releases_it() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (_tx, rx) = mpsc::unbounded_channel();
        let hook_calls = calls.clone();
        let sub = Subscription::new(rx, move || {
            hook_calls.fetch_add(1, Ordering::SeqCst);
        });
        drop(sub);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_latest_keeps_only_newest_snapshot() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = Subscription::new(rx, || {});
        for n in 1..=3 {
            let docs = (0..n)
                .map(|i| Document::new(i.to_string(), Default::default()))
                .collect();
            tx.send(docs).unwrap();
        }
        assert_eq!(sub.latest().map(|s| s.len()), Some(3));
        assert_eq!(sub.latest(), None);
    }
}
