use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::Document;

pub const FIELD_ITEM_ID: &str = "itemId";
pub const FIELD_AUTHOR_ID: &str = "authorId";
pub const FIELD_RATING: &str = "rating";
pub const FIELD_BODY: &str = "body";
pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_UPDATED_AT: &str = "updatedAt";

/// Review - one author's rating and text for one Item
///
/// `item_id` and `author_id` never change after creation; at most one
/// Review exists per `(item_id, author_id)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub item_id: String,
    pub author_id: String,
    pub rating: f64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Parse a review document
    ///
    /// Returns `None` when any of itemId / authorId / rating / body is
    /// missing or mistyped; listings skip such documents.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let f = &doc.fields;
        let item_id = f.get_str(FIELD_ITEM_ID)?;
        let author_id = f.get_str(FIELD_AUTHOR_ID)?;
        let rating = f.get_f64(FIELD_RATING)?;
        let body = f.get_str(FIELD_BODY)?;

        Some(Self {
            id: doc.id.clone(),
            item_id: item_id.to_string(),
            author_id: author_id.to_string(),
            rating,
            body: body.to_string(),
            // A write still waiting for its server timestamp reads as "now"
            created_at: f.get_timestamp(FIELD_CREATED_AT).unwrap_or_else(Utc::now),
            updated_at: f.get_timestamp(FIELD_UPDATED_AT),
        })
    }

    /// Whether the review was edited after creation
    pub fn is_edited(&self) -> bool {
        self.updated_at
            .map(|updated| updated > self.created_at)
            .unwrap_or(false)
    }
}
