use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::Document;

pub const FIELD_ADDED_AT: &str = "addedAt";

/// Membership record in a user's saved-items collection
///
/// The document id is the item id; existence is the only signal that
/// matters, `added_at` is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub item_id: String,
    pub added_at: Option<DateTime<Utc>>,
}

impl WishlistEntry {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            item_id: doc.id.clone(),
            added_at: doc.fields.get_timestamp(FIELD_ADDED_AT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Fields;

    #[test]
    fn test_item_id_comes_from_document_id() {
        let doc = Document::new(
            "g7",
            Fields::new().with(FIELD_ADDED_AT, "2025-11-01T10:00:00.000000Z"),
        );
        let entry = WishlistEntry::from_document(&doc);
        assert_eq!(entry.item_id, "g7");
        assert!(entry.added_at.is_some());
    }

    #[test]
    fn test_pending_timestamp_still_counts_as_member() {
        let entry = WishlistEntry::from_document(&Document::new("g7", Fields::new()));
        assert_eq!(entry.item_id, "g7");
        assert_eq!(entry.added_at, None);
    }
}
