//! Item listings: top rated, most recent, title prefix search, by id
//!
//! Items lacking the ordered field (an item never recomputed has no
//! aggregate yet) are left out of the ordered listings.

use std::sync::Arc;
use std::time::Instant;

use tally_core::model::{collections, item};
use tally_core::store::{Filter, Query};
use tally_core::{aggregate, log_op_start, Item, RemoteStore, Result, TallyError};
use tally_core_types::RequestId;

use super::batch_fetch::BatchFetcher;
use super::finish;
use crate::config::{BatchConfig, CatalogConfig};

/// Highest code point in the basic multilingual plane's private use area;
/// appended to a prefix it bounds every string starting with that prefix
const PREFIX_END: char = '\u{f8ff}';

pub struct Catalog {
    store: Arc<dyn RemoteStore>,
    fetcher: BatchFetcher,
    default_limit: usize,
}

impl Catalog {
    pub fn new(store: Arc<dyn RemoteStore>, batch: &BatchConfig, config: &CatalogConfig) -> Self {
        Self {
            fetcher: BatchFetcher::new(store.clone(), batch),
            store,
            default_limit: config.default_limit,
        }
    }

    /// Items by aggregate score, highest first
    ///
    /// # Errors
    /// * `Remote` - the query failed
    pub async fn top_rated(&self, limit: Option<usize>) -> Result<Vec<Item>> {
        let query = Query::new()
            .order_by(aggregate::FIELD_SCORE, true)
            .limit(limit.unwrap_or(self.default_limit));
        self.list("top_rated", query).await
    }

    /// Items by release date, newest first
    ///
    /// Ordered on the stored value: string dates sort among themselves and
    /// legacy epoch-second dates (numbers) all come after them, whatever
    /// the actual date. `Item::release_date` normalises both for display
    /// only.
    ///
    /// # Errors
    /// * `Remote` - the query failed
    pub async fn recent(&self, limit: Option<usize>) -> Result<Vec<Item>> {
        let query = Query::new()
            .order_by(item::FIELD_RELEASE_DATE, true)
            .limit(limit.unwrap_or(self.default_limit));
        self.list("recent", query).await
    }

    /// Items whose title starts with `prefix`, by title
    ///
    /// Case-sensitive, like the underlying range query.
    ///
    /// # Errors
    /// * `InvalidInput` - blank prefix
    /// * `Remote` - the query failed
    pub async fn search_by_title(&self, prefix: &str, limit: Option<usize>) -> Result<Vec<Item>> {
        if prefix.trim().is_empty() {
            return Err(TallyError::invalid_input("search prefix cannot be blank"));
        }
        let query = Query::new()
            .filter(Filter::gte(item::FIELD_TITLE, prefix))
            .filter(Filter::lte(item::FIELD_TITLE, format!("{}{}", prefix, PREFIX_END)))
            .order_by(item::FIELD_TITLE, false)
            .limit(limit.unwrap_or(self.default_limit));
        self.list("search_by_title", query).await
    }

    /// Items by id in the given order (see `BatchFetcher::fetch_many`)
    ///
    /// # Errors
    /// * `Remote` - a chunk query failed
    pub async fn fetch_many(&self, ids: &[String]) -> Result<Vec<Item>> {
        self.fetcher.fetch_many(ids).await
    }

    async fn list(&self, op: &'static str, query: Query) -> Result<Vec<Item>> {
        let request_id = RequestId::new();
        let started = Instant::now();
        log_op_start!(op, request_id = %request_id, limit = ?query.limit);

        let result = self
            .store
            .query(collections::ITEMS, &query)
            .await
            .map(|docs| docs.into_iter().map(Item::from_document).collect())
            .map_err(TallyError::from);
        finish(op, &request_id, started, result)
    }
}
