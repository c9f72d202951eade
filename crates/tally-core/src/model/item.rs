use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::document::Document;
use super::fields::Fields;
use crate::aggregate::Aggregate;

pub const FIELD_TITLE: &str = "title";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_COVER_URL: &str = "coverUrl";
pub const FIELD_GENRES: &str = "genres";
pub const FIELD_PLATFORMS: &str = "platforms";
pub const FIELD_RELEASE_DATE: &str = "releaseDate";

/// Item - the rated catalog entity
///
/// Display fields are opaque to the engines and kept in `attributes`; the
/// only fields the engines own are the derived aggregate, which is written
/// exclusively by the recompute step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Store-assigned identifier
    pub id: String,

    /// Every stored field, including the aggregate fields
    pub attributes: Fields,

    /// Derived `(average, count)` read from the document
    pub aggregate: Aggregate,
}

impl Item {
    /// Build an Item from a store document
    ///
    /// Never fails: an item with no aggregate fields yet reads as `(0.0, 0)`.
    pub fn from_document(doc: Document) -> Self {
        let aggregate = Aggregate::from_fields(&doc.fields);
        Self {
            id: doc.id,
            attributes: doc.fields,
            aggregate,
        }
    }

    pub fn aggregate_score(&self) -> f64 {
        self.aggregate.score
    }

    pub fn aggregate_count(&self) -> u64 {
        self.aggregate.count
    }

    pub fn title(&self) -> Option<&str> {
        self.attributes.get_str(FIELD_TITLE)
    }

    pub fn description(&self) -> &str {
        self.attributes.get_str(FIELD_DESCRIPTION).unwrap_or_default()
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.attributes.get_str(FIELD_COVER_URL)
    }

    pub fn genres(&self) -> Vec<String> {
        self.attributes.get_str_list(FIELD_GENRES)
    }

    pub fn platforms(&self) -> Vec<String> {
        self.attributes.get_str_list(FIELD_PLATFORMS)
    }

    /// Release date as `YYYY-MM-DD`
    ///
    /// Stored either as a string (returned as is) or, for legacy documents,
    /// as seconds since the Unix epoch.
    pub fn release_date(&self) -> Option<String> {
        let value = self.attributes.get(FIELD_RELEASE_DATE)?;
        if let Some(s) = value.as_str() {
            return Some(s.to_string());
        }
        let seconds = value.as_f64()?;
        DateTime::from_timestamp(seconds as i64, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(fields: Fields) -> Document {
        Document::new("g1", fields)
    }

    #[test]
    fn test_item_without_aggregate_reads_as_zero() {
        let item = Item::from_document(doc(Fields::new().with(FIELD_TITLE, "Celeste")));
        assert_eq!(item.id, "g1");
        assert_eq!(item.aggregate_score(), 0.0);
        assert_eq!(item.aggregate_count(), 0);
        assert_eq!(item.title(), Some("Celeste"));
        assert_eq!(item.description(), "");
    }

    #[test]
    fn test_item_reads_display_fields() {
        let item = Item::from_document(doc(
            Fields::new()
                .with(FIELD_COVER_URL, "https://img/1.png")
                .with(FIELD_GENRES, json!(["platformer"]))
                .with(FIELD_PLATFORMS, json!(["pc", "switch"]))
                .with(crate::aggregate::FIELD_SCORE, 3.5)
                .with(crate::aggregate::FIELD_COUNT, 2),
        ));
        assert_eq!(item.cover_url(), Some("https://img/1.png"));
        assert_eq!(item.genres(), vec!["platformer"]);
        assert_eq!(item.platforms().len(), 2);
        assert_eq!(item.aggregate, Aggregate::new(3.5, 2));
    }

    #[test]
    fn test_release_date_string_and_legacy_seconds() {
        let as_string = Item::from_document(doc(Fields::new().with(FIELD_RELEASE_DATE, "2018-01-25")));
        assert_eq!(as_string.release_date().as_deref(), Some("2018-01-25"));

        // 2018-01-25T00:00:00Z
        let as_seconds = Item::from_document(doc(Fields::new().with(FIELD_RELEASE_DATE, 1_516_838_400)));
        assert_eq!(as_seconds.release_date().as_deref(), Some("2018-01-25"));

        let missing = Item::from_document(doc(Fields::new()));
        assert_eq!(missing.release_date(), None);
    }
}
