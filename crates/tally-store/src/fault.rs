//! Fault and latency injection for exercising failure paths
//!
//! A `Fault` targets one operation kind, optionally narrowed to a
//! collection and a document id. For reads by filter (query/subscribe) the
//! document id matches when an equality or in-set filter on the document
//! id names it, which is how a single batch-fetch chunk is made to fail.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tally_core::store::{Filter, Query, DOCUMENT_ID};
use tally_core::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Query,
    Create,
    Set,
    Update,
    Delete,
    Subscribe,
}

/// One injected misbehaviour
#[derive(Debug, Clone)]
pub struct Fault {
    op: StoreOp,
    collection: Option<String>,
    document_id: Option<String>,
    delay: Option<Duration>,
    error: Option<StoreError>,
    remaining: Option<usize>,
}

impl Fault {
    /// Fail every matching call with `error`
    pub fn fail(op: StoreOp, error: StoreError) -> Self {
        Self {
            op,
            collection: None,
            document_id: None,
            delay: None,
            error: Some(error),
            remaining: None,
        }
    }

    /// Delay every matching call, then let it proceed
    pub fn delay(op: StoreOp, delay: Duration) -> Self {
        Self {
            op,
            collection: None,
            document_id: None,
            delay: Some(delay),
            error: None,
            remaining: None,
        }
    }

    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn on_document(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    /// Add latency before the failure (or before proceeding)
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Only trigger for the next `n` matching calls
    pub fn times(mut self, n: usize) -> Self {
        self.remaining = Some(n);
        self
    }

    fn matches(&self, op: StoreOp, collection: &str, target: &Target<'_>) -> bool {
        if self.op != op || self.remaining == Some(0) {
            return false;
        }
        if let Some(c) = &self.collection {
            if c != collection {
                return false;
            }
        }
        match &self.document_id {
            None => true,
            Some(wanted) => target.names(wanted),
        }
    }
}

/// What an operation addresses, for matching `Fault::on_document`
pub(crate) enum Target<'a> {
    Document(&'a str),
    Query(&'a Query),
    Collection,
}

impl Target<'_> {
    fn names(&self, wanted: &str) -> bool {
        match self {
            Target::Document(id) => *id == wanted,
            Target::Query(query) => query.filters.iter().any(|f| match f {
                Filter::Eq(field, Value::String(id)) if field == DOCUMENT_ID => id == wanted,
                Filter::In(field, values) if field == DOCUMENT_ID => values
                    .iter()
                    .any(|v| v.as_str() == Some(wanted)),
                _ => false,
            }),
            Target::Collection => false,
        }
    }
}

/// Fault table plus call counters
#[derive(Debug, Default)]
pub(crate) struct FaultInjector {
    faults: Mutex<Vec<Fault>>,
    counts: Mutex<HashMap<StoreOp, usize>>,
}

/// What the store should do for one call
pub(crate) struct Decision {
    pub delay: Option<Duration>,
    pub error: Option<StoreError>,
}

impl FaultInjector {
    pub fn push(&self, fault: Fault) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push(fault);
        }
    }

    pub fn count(&self, op: StoreOp) -> usize {
        self.counts
            .lock()
            .map(|c| c.get(&op).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn reset_counts(&self) {
        if let Ok(mut counts) = self.counts.lock() {
            counts.clear();
        }
    }

    /// Record the call and pick the first matching fault, consuming one use
    pub fn decide(&self, op: StoreOp, collection: &str, target: Target<'_>) -> Decision {
        if let Ok(mut counts) = self.counts.lock() {
            *counts.entry(op).or_insert(0) += 1;
        }

        let mut decision = Decision {
            delay: None,
            error: None,
        };
        let Ok(mut faults) = self.faults.lock() else {
            return decision;
        };
        if let Some(fault) = faults
            .iter_mut()
            .find(|f| f.matches(op, collection, &target))
        {
            if let Some(n) = fault.remaining.as_mut() {
                *n -= 1;
            }
            decision.delay = fault.delay;
            decision.error = fault.error.clone();
        }
        decision
    }
}
