//! Derived `(average, count)` pair stored on every Item
//!
//! The aggregate is always recomputed from the full review set rather than
//! adjusted incrementally, so its value depends only on the reviews that
//! exist when it is computed.

use serde::{Deserialize, Serialize};

use crate::model::Fields;
use crate::store::{FieldValue, WriteFields};

pub const FIELD_SCORE: &str = "aggregateScore";
pub const FIELD_COUNT: &str = "aggregateCount";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Mean rating, 0.0 for an empty set
    pub score: f64,
    pub count: u64,
}

impl Aggregate {
    pub const EMPTY: Aggregate = Aggregate {
        score: 0.0,
        count: 0,
    };

    pub fn new(score: f64, count: u64) -> Self {
        Self { score, count }
    }

    /// Compute the aggregate over a set of ratings
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0.0_f64, 0_u64), |(sum, count), r| (sum + r, count + 1));

        if count == 0 {
            return Self::EMPTY;
        }
        Self {
            score: sum / count as f64,
            count,
        }
    }

    /// Read the aggregate stored on an item document (missing = empty)
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            score: fields.get_f64(FIELD_SCORE).unwrap_or(0.0),
            count: fields.get_u64(FIELD_COUNT).unwrap_or(0),
        }
    }

    /// The two-field partial update written to the item document
    pub fn to_write_fields(&self) -> WriteFields {
        let mut fields = WriteFields::new();
        fields.insert(FIELD_SCORE.to_string(), FieldValue::from(self.score));
        fields.insert(FIELD_COUNT.to_string(), FieldValue::from(self.count));
        fields
    }
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_is_zero() {
        assert_eq!(Aggregate::from_ratings(Vec::new()), Aggregate::new(0.0, 0));
    }

    #[test]
    fn test_mean_and_count() {
        assert_eq!(Aggregate::from_ratings([4.0, 2.0]), Aggregate::new(3.0, 2));
        assert_eq!(Aggregate::from_ratings([5.0]), Aggregate::new(5.0, 1));
    }

    #[test]
    fn test_order_of_ratings_does_not_matter() {
        let a = Aggregate::from_ratings([1.0, 2.5, 5.0, 0.5]);
        let b = Aggregate::from_ratings([5.0, 0.5, 2.5, 1.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_fields_round_trip_through_document_fields() {
        let agg = Aggregate::new(3.5, 2);
        let written: Fields = agg
            .to_write_fields()
            .into_iter()
            .filter_map(|(k, v)| match v {
                FieldValue::Value(v) => Some((k, v)),
                FieldValue::ServerTimestamp => None,
            })
            .collect();
        assert_eq!(Aggregate::from_fields(&written), agg);
    }
}
