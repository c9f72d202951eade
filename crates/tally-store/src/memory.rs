//! In-memory `RemoteStore`
//!
//! Holds every collection behind one mutex. Writes resolve server
//! timestamps, apply, then push a fresh full snapshot to each live
//! subscription on the written collection before the lock is released, so
//! listeners observe writes in commit order.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::mpsc;
use uuid::Uuid;

use tally_core::model::{Document, Fields};
use tally_core::store::{FieldValue, Query, Snapshot, StoreResult, Subscription, WriteFields};
use tally_core::{RemoteStore, StoreError, TallyError};

use crate::clock::ServerClock;
use crate::fault::{Fault, FaultInjector, StoreOp, Target};
use crate::query_eval::{check_query, run_query};

/// Tunables of the in-memory store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MemoryStoreConfig {
    /// Largest value list an `In` filter may carry
    pub max_in_filter_len: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_in_filter_len: 10,
        }
    }
}

impl MemoryStoreConfig {
    /// # Errors
    /// * `InvalidInput` - `max_in_filter_len` is zero
    pub fn validate(&self) -> tally_core::Result<()> {
        if self.max_in_filter_len == 0 {
            return Err(TallyError::invalid_input(
                "store.max_in_filter_len must be at least 1",
            ));
        }
        Ok(())
    }
}

type Collection = BTreeMap<String, Fields>;

struct Listener {
    id: u64,
    collection: String,
    query: Query,
    sender: mpsc::UnboundedSender<Snapshot>,
}

#[derive(Default)]
struct State {
    collections: HashMap<String, Collection>,
    listeners: Vec<Listener>,
}

impl State {
    /// Push the current result of every listener on `collection`, dropping
    /// listeners whose receiving side is gone
    fn notify(&mut self, collection: &str) {
        let docs = self.collections.get(collection);
        self.listeners.retain(|listener| {
            if listener.collection != collection {
                return true;
            }
            let snapshot = match docs {
                Some(docs) => run_query(docs, &listener.query),
                None => Vec::new(),
            };
            listener.sender.send(snapshot).is_ok()
        });
    }
}

struct Inner {
    config: MemoryStoreConfig,
    state: Mutex<State>,
    clock: ServerClock,
    faults: FaultInjector,
    next_listener_id: AtomicU64,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Shared-handle in-memory document store; clones address the same data
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(State::default()),
                clock: ServerClock::new(),
                faults: FaultInjector::default(),
                next_listener_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &MemoryStoreConfig {
        &self.inner.config
    }

    /// Arm a fault; faults are checked in insertion order
    pub fn inject_fault(&self, fault: Fault) {
        self.inner.faults.push(fault);
    }

    /// Calls of `op` made so far, including ones that failed
    pub fn op_count(&self, op: StoreOp) -> usize {
        self.inner.faults.count(op)
    }

    pub fn reset_op_counts(&self) {
        self.inner.faults.reset_counts();
    }

    /// Write a document directly, bypassing faults and counters
    pub fn insert_document(&self, collection: &str, id: &str, fields: Fields) {
        let mut state = self.inner.state();
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        state.notify(collection);
    }

    /// Read a document directly, bypassing faults and counters
    pub fn document(&self, collection: &str, id: &str) -> Option<Fields> {
        self.inner
            .state()
            .collections
            .get(collection)
            .and_then(|c| c.get(id).cloned())
    }

    pub fn collection_len(&self, collection: &str) -> usize {
        self.inner
            .state()
            .collections
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    /// Copy of every non-empty collection, keyed by path
    pub(crate) fn dump(&self) -> BTreeMap<String, Collection> {
        self.inner
            .state()
            .collections
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(path, docs)| (path.clone(), docs.clone()))
            .collect()
    }

    /// Live subscriptions on `collection`
    pub fn listener_count(&self, collection: &str) -> usize {
        self.inner
            .state()
            .listeners
            .iter()
            .filter(|l| l.collection == collection)
            .count()
    }

    async fn gate(&self, op: StoreOp, collection: &str, target: Target<'_>) -> StoreResult<()> {
        let decision = self.inner.faults.decide(op, collection, target);
        if let Some(delay) = decision.delay {
            tokio::time::sleep(delay).await;
        }
        match decision.error {
            Some(err) => {
                tracing::debug!(?op, collection, code = %err.code, "injected store fault");
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Turn write placeholders into stored values; every server timestamp in
    /// one write gets the same stamp
    fn resolve(&self, data: WriteFields) -> Vec<(String, serde_json::Value)> {
        let mut stamp: Option<String> = None;
        data.into_iter()
            .map(|(key, value)| {
                let value = match value {
                    FieldValue::Value(v) => v,
                    FieldValue::ServerTimestamp => serde_json::Value::String(
                        stamp
                            .get_or_insert_with(|| self.inner.clock.now_rfc3339())
                            .clone(),
                    ),
                };
                (key, value)
            })
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn max_in_filter_len(&self) -> usize {
        self.inner.config.max_in_filter_len
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.gate(StoreOp::Get, collection, Target::Document(id))
            .await?;
        Ok(self
            .document(collection, id)
            .map(|fields| Document::new(id, fields)))
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        check_query(query, self.inner.config.max_in_filter_len)?;
        self.gate(StoreOp::Query, collection, Target::Query(query))
            .await?;
        let state = self.inner.state();
        Ok(match state.collections.get(collection) {
            Some(docs) => run_query(docs, query),
            None => Vec::new(),
        })
    }

    async fn create(&self, collection: &str, data: WriteFields) -> StoreResult<String> {
        self.gate(StoreOp::Create, collection, Target::Collection)
            .await?;
        let id = Uuid::now_v7().simple().to_string();
        let fields: Fields = self.resolve(data).into_iter().collect();

        let mut state = self.inner.state();
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        state.notify(collection);
        tracing::debug!(collection, id = %id, "document created");
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: WriteFields) -> StoreResult<()> {
        self.gate(StoreOp::Set, collection, Target::Document(id))
            .await?;
        let fields: Fields = self.resolve(data).into_iter().collect();

        let mut state = self.inner.state();
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        state.notify(collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: WriteFields) -> StoreResult<()> {
        self.gate(StoreOp::Update, collection, Target::Document(id))
            .await?;
        let resolved = self.resolve(fields);

        let mut state = self.inner.state();
        let existing = state
            .collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        for (key, value) in resolved {
            existing.set(key, value);
        }
        state.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.gate(StoreOp::Delete, collection, Target::Document(id))
            .await?;
        let mut state = self.inner.state();
        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .is_some();
        if removed {
            state.notify(collection);
        }
        Ok(())
    }

    async fn subscribe(&self, collection: &str, query: &Query) -> StoreResult<Subscription> {
        check_query(query, self.inner.config.max_in_filter_len)?;
        self.gate(StoreOp::Subscribe, collection, Target::Query(query))
            .await?;

        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut state = self.inner.state();
        let initial = match state.collections.get(collection) {
            Some(docs) => run_query(docs, query),
            None => Vec::new(),
        };
        // Receiver is alive in this scope
        let _ = sender.send(initial);
        state.listeners.push(Listener {
            id,
            collection: collection.to_string(),
            query: query.clone(),
            sender,
        });
        drop(state);
        tracing::debug!(collection, listener = id, "subscription registered");

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(receiver, move || {
            if let Some(inner) = weak.upgrade() {
                inner.state().listeners.retain(|l| l.id != id);
            }
        }))
    }
}
