//! Review lifecycle and aggregate maintenance
//!
//! Every successful create/update/delete is followed by a recompute of the
//! owning item's aggregate from its full review set. The recompute is not
//! transactional with the review write: when the write lands and the
//! recompute fails, the error is returned and the review stays written. A
//! later recompute (any mutation on the item, or the backfill job) brings
//! the aggregate back in line.

use std::sync::Arc;
use std::time::Instant;

use tally_core::model::{collections, review};
use tally_core::rules::{validate_review_input, RatingBounds};
use tally_core::store::{FieldValue, Filter, Query, WriteFields};
use tally_core::{log_op_start, Aggregate, Document, RemoteStore, Result, Review, TallyError};
use tally_core_types::RequestId;

use super::finish;
use crate::config::ReviewConfig;

pub struct ReviewEngine {
    store: Arc<dyn RemoteStore>,
    bounds: RatingBounds,
}

impl ReviewEngine {
    pub fn new(store: Arc<dyn RemoteStore>, config: &ReviewConfig) -> Self {
        Self {
            store,
            bounds: config.bounds(),
        }
    }

    /// Create a review and recompute its item's aggregate
    ///
    /// Returns the new review's id.
    ///
    /// # Errors
    /// * `DuplicateSubmission` - the author already reviewed this item
    /// * `InvalidInput` - rating out of range or blank body
    /// * `Remote` - duplicate check, write or recompute failed
    pub async fn add(
        &self,
        item_id: &str,
        author_id: &str,
        rating: f64,
        body: &str,
    ) -> Result<String> {
        let op = "add_review";
        let request_id = RequestId::new();
        let started = Instant::now();
        log_op_start!(op, request_id = %request_id, item_id = item_id, user_id = author_id);

        let result = self.create_review(item_id, author_id, rating, body).await;
        finish(op, &request_id, started, result)
    }

    async fn create_review(
        &self,
        item_id: &str,
        author_id: &str,
        rating: f64,
        body: &str,
    ) -> Result<String> {
        if self.find_user_review(item_id, author_id).await?.is_some() {
            return Err(TallyError::DuplicateSubmission {
                item_id: item_id.to_string(),
                author_id: author_id.to_string(),
            });
        }
        validate_review_input(rating, body, &self.bounds)?;

        let mut data = WriteFields::new();
        data.insert(review::FIELD_ITEM_ID.to_string(), item_id.into());
        data.insert(review::FIELD_AUTHOR_ID.to_string(), author_id.into());
        data.insert(review::FIELD_RATING.to_string(), rating.into());
        data.insert(review::FIELD_BODY.to_string(), body.into());
        data.insert(review::FIELD_CREATED_AT.to_string(), FieldValue::ServerTimestamp);
        data.insert(review::FIELD_UPDATED_AT.to_string(), FieldValue::ServerTimestamp);
        let review_id = self.store.create(collections::REVIEWS, data).await?;

        self.recompute_item(item_id).await?;
        Ok(review_id)
    }

    /// Change a review's rating and body, then recompute its item
    ///
    /// `itemId` and `authorId` are never touched.
    ///
    /// # Errors
    /// * `InvalidInput` - rating out of range or blank body
    /// * `NotFound` - no review with this id
    /// * `Serialization` - the stored review has no item id
    /// * `Remote` - load, write or recompute failed
    pub async fn update(&self, review_id: &str, rating: f64, body: &str) -> Result<()> {
        let op = "update_review";
        let request_id = RequestId::new();
        let started = Instant::now();
        log_op_start!(op, request_id = %request_id, review_id = review_id);

        let result = self.edit_review(review_id, rating, body).await;
        finish(op, &request_id, started, result)
    }

    async fn edit_review(&self, review_id: &str, rating: f64, body: &str) -> Result<()> {
        validate_review_input(rating, body, &self.bounds)?;

        let existing = self
            .store
            .get(collections::REVIEWS, review_id)
            .await?
            .ok_or_else(|| TallyError::NotFound {
                collection: collections::REVIEWS.to_string(),
                id: review_id.to_string(),
            })?;
        let item_id = existing
            .fields
            .get_str(review::FIELD_ITEM_ID)
            .ok_or_else(|| TallyError::Serialization {
                message: format!("review {} has no {}", review_id, review::FIELD_ITEM_ID),
            })?
            .to_string();

        let mut fields = WriteFields::new();
        fields.insert(review::FIELD_RATING.to_string(), rating.into());
        fields.insert(review::FIELD_BODY.to_string(), body.into());
        fields.insert(review::FIELD_UPDATED_AT.to_string(), FieldValue::ServerTimestamp);
        self.store
            .update(collections::REVIEWS, review_id, fields)
            .await?;

        self.recompute_item(&item_id).await?;
        Ok(())
    }

    /// Delete a review, then recompute `item_id`
    ///
    /// The caller passes the item id because it cannot be read back from a
    /// deleted document. Deleting an already-missing review still recomputes.
    ///
    /// # Errors
    /// * `Remote` - delete or recompute failed
    pub async fn delete(&self, review_id: &str, item_id: &str) -> Result<()> {
        let op = "delete_review";
        let request_id = RequestId::new();
        let started = Instant::now();
        log_op_start!(op, request_id = %request_id, review_id = review_id, item_id = item_id);

        let result = self.remove_review(review_id, item_id).await;
        finish(op, &request_id, started, result)
    }

    async fn remove_review(&self, review_id: &str, item_id: &str) -> Result<()> {
        self.store.delete(collections::REVIEWS, review_id).await?;
        self.recompute_item(item_id).await?;
        Ok(())
    }

    /// Recompute and store an item's aggregate from its current reviews
    ///
    /// Idempotent: the written value depends only on the review set read
    /// during this call.
    ///
    /// # Errors
    /// * `Remote` - review query failed, or the item does not exist
    pub async fn recompute(&self, item_id: &str) -> Result<Aggregate> {
        let op = "recompute";
        let request_id = RequestId::new();
        let started = Instant::now();
        log_op_start!(op, request_id = %request_id, item_id = item_id);

        let result = self.recompute_item(item_id).await;
        finish(op, &request_id, started, result)
    }

    /// All reviews of an item, newest first, ties by review id
    ///
    /// Lists every review recompute counts; one without a `createdAt` reads
    /// as just written. Documents that do not parse as a review are skipped.
    ///
    /// # Errors
    /// * `Remote` - the query failed
    pub async fn fetch_for_item(&self, item_id: &str) -> Result<Vec<Review>> {
        let op = "fetch_reviews";
        let request_id = RequestId::new();
        let started = Instant::now();
        log_op_start!(op, request_id = %request_id, item_id = item_id);

        let query = Query::new().filter(Filter::eq(review::FIELD_ITEM_ID, item_id));
        let result = self
            .store
            .query(collections::REVIEWS, &query)
            .await
            .map(|docs| {
                let mut reviews: Vec<Review> =
                    docs.iter().filter_map(Review::from_document).collect();
                reviews.sort_by(|a, b| {
                    b.created_at
                        .cmp(&a.created_at)
                        .then_with(|| a.id.cmp(&b.id))
                });
                reviews
            })
            .map_err(TallyError::from);

        finish(op, &request_id, started, result)
    }

    /// The author's review of an item, if any
    ///
    /// # Errors
    /// * `Remote` - the query failed
    pub async fn fetch_user_review(&self, item_id: &str, author_id: &str) -> Result<Option<Review>> {
        let op = "fetch_user_review";
        let request_id = RequestId::new();
        let started = Instant::now();
        log_op_start!(op, request_id = %request_id, item_id = item_id, user_id = author_id);

        let result = self
            .find_user_review(item_id, author_id)
            .await
            .map(|doc| doc.as_ref().and_then(Review::from_document));
        finish(op, &request_id, started, result)
    }

    async fn find_user_review(&self, item_id: &str, author_id: &str) -> Result<Option<Document>> {
        let query = Query::new()
            .filter(Filter::eq(review::FIELD_ITEM_ID, item_id))
            .filter(Filter::eq(review::FIELD_AUTHOR_ID, author_id))
            .limit(1);
        let docs = self.store.query(collections::REVIEWS, &query).await?;
        Ok(docs.into_iter().next())
    }

    /// Unlogged recompute shared by the mutations and the backfill job
    pub(crate) async fn recompute_item(&self, item_id: &str) -> Result<Aggregate> {
        let query = Query::new().filter(Filter::eq(review::FIELD_ITEM_ID, item_id));
        let docs = self.store.query(collections::REVIEWS, &query).await?;

        // Only documents with a numeric rating count
        let aggregate = Aggregate::from_ratings(
            docs.iter()
                .filter_map(|doc| doc.fields.get_f64(review::FIELD_RATING)),
        );
        self.store
            .update(collections::ITEMS, item_id, aggregate.to_write_fields())
            .await?;

        tracing::debug!(
            item_id,
            aggregate_score = aggregate.score,
            aggregate_count = aggregate.count,
            "aggregate written"
        );
        Ok(aggregate)
    }
}
