//! Corpus-wide aggregate repair
//!
//! Lists every item and recomputes each one independently, with bounded
//! concurrency. A failing item is logged and recorded in the report; it
//! never stops the others. Safe to run alongside live traffic because the
//! recompute is idempotent.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

use tally_core::model::collections;
use tally_core::store::Query;
use tally_core::{log_op_start, Aggregate, ExError, RemoteStore, Result, TallyError};
use tally_core_types::schema::EVENT_ITEM;
use tally_core_types::RequestId;

use super::finish;
use super::reviews::ReviewEngine;
use crate::config::BackfillConfig;

/// Result of recomputing one item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub item_id: String,
    pub result: std::result::Result<Aggregate, TallyError>,
}

/// Per-item outcomes of one `recompute_all` run, ordered by item id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BackfillReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn outcome(&self, item_id: &str) -> Option<&ItemOutcome> {
        self.outcomes.iter().find(|o| o.item_id == item_id)
    }
}

pub struct BackfillJob {
    store: Arc<dyn RemoteStore>,
    reviews: Arc<ReviewEngine>,
    concurrency: usize,
}

impl BackfillJob {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        reviews: Arc<ReviewEngine>,
        config: &BackfillConfig,
    ) -> Self {
        Self {
            store,
            reviews,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Recompute the aggregate of every item
    ///
    /// Individual failures land in the report, not in the return value.
    ///
    /// # Errors
    /// * `Remote` - the item listing itself failed
    pub async fn recompute_all(&self) -> Result<BackfillReport> {
        let op = "recompute_all";
        let request_id = RequestId::new();
        let started = Instant::now();
        log_op_start!(op, request_id = %request_id, concurrency = self.concurrency);

        let result = self.run(op, &request_id).await;
        finish(op, &request_id, started, result)
    }

    async fn run(&self, op: &'static str, request_id: &RequestId) -> Result<BackfillReport> {
        let items = self.store.query(collections::ITEMS, &Query::new()).await?;
        tracing::info!(op, request_id = %request_id, id_count = items.len(), "items listed");

        let mut outcomes: Vec<ItemOutcome> = stream::iter(items)
            .map(|doc| async move {
                let result = self.reviews.recompute_item(&doc.id).await;
                log_item(op, request_id, &doc.id, &result);
                ItemOutcome {
                    item_id: doc.id,
                    result,
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        outcomes.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        Ok(BackfillReport { outcomes })
    }
}

fn log_item(
    op: &str,
    request_id: &RequestId,
    item_id: &str,
    result: &std::result::Result<Aggregate, TallyError>,
) {
    match result {
        Ok(aggregate) => tracing::info!(
            op,
            event = EVENT_ITEM,
            request_id = %request_id,
            item_id,
            aggregate_score = aggregate.score,
            aggregate_count = aggregate.count,
        ),
        Err(err) => {
            let ex: ExError = err.into();
            tracing::warn!(
                op,
                event = EVENT_ITEM,
                request_id = %request_id,
                item_id,
                err.kind = ?ex.kind(),
                err.code = ex.code(),
                message = ex.message(),
            );
        }
    }
}
