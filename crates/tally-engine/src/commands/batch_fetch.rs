//! Fetch many documents by id through the store's bounded in-set filter
//!
//! Ids are split into fixed-size chunks, one store query per chunk. All
//! chunk queries run concurrently and the call completes only when every
//! one has finished. Any chunk failure fails the whole call with the error
//! of the earliest-submitted failing chunk; partial results are dropped.
//! On success the output follows the caller's id order, skipping ids with
//! no matching document.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tally_core::model::collections;
use tally_core::store::{Filter, Query};
use tally_core::{log_op_start, Document, Item, RemoteStore, Result};
use tally_core_types::RequestId;

use super::finish;
use crate::config::BatchConfig;

pub struct BatchFetcher {
    store: Arc<dyn RemoteStore>,
    chunk_size: usize,
}

impl BatchFetcher {
    /// Chunk size is the configured size capped by the store's in-filter limit
    pub fn new(store: Arc<dyn RemoteStore>, config: &BatchConfig) -> Self {
        let chunk_size = config.chunk_size.min(store.max_in_filter_len()).max(1);
        Self { store, chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fetch items by id, preserving the order of `ids`
    ///
    /// # Errors
    /// * `Remote` - a chunk query failed (earliest chunk's error)
    pub async fn fetch_many(&self, ids: &[String]) -> Result<Vec<Item>> {
        let docs = self.fetch_documents(collections::ITEMS, ids).await?;
        Ok(docs.into_iter().map(Item::from_document).collect())
    }

    /// Collection-agnostic form of `fetch_many`
    ///
    /// # Errors
    /// * `Remote` - a chunk query failed (earliest chunk's error)
    pub async fn fetch_documents(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let op = "fetch_many";
        let request_id = RequestId::new();
        let started = Instant::now();
        let chunk_count = ids.len().div_ceil(self.chunk_size);
        log_op_start!(
            op,
            request_id = %request_id,
            id_count = ids.len(),
            chunk_count = chunk_count
        );

        let result = self.fetch_chunks(collection, ids).await;
        finish(op, &request_id, started, result)
    }

    async fn fetch_chunks(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        let reads = ids.chunks(self.chunk_size).map(|chunk| {
            let query = Query::new().filter(Filter::id_in(chunk.iter().cloned()));
            async move { self.store.query(collection, &query).await }
        });

        // join_all yields results in submission order, so the first Err
        // seen here belongs to the earliest failing chunk
        let mut by_id: HashMap<String, Document> = HashMap::with_capacity(ids.len());
        for chunk_result in join_all(reads).await {
            for doc in chunk_result? {
                by_id.insert(doc.id.clone(), doc);
            }
        }

        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }
}
