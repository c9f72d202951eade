//! Filter matching and ordering over in-memory documents
//!
//! Follows document-store semantics rather than SQL:
//! - comparisons only match values of the same type
//! - a document lacking a filtered or ordered field is excluded
//! - ties (and unordered queries) fall back to document id order

use serde_json::Value;
use std::cmp::Ordering;

use tally_core::model::{Document, Fields};
use tally_core::store::{Filter, Query, DOCUMENT_ID};
use tally_core::StoreError;

/// Reject queries the store would refuse outright
pub fn check_query(query: &Query, max_in_filter_len: usize) -> Result<(), StoreError> {
    for filter in &query.filters {
        if let Filter::In(field, values) = filter {
            if values.is_empty() {
                return Err(StoreError::invalid_argument(format!(
                    "'in' filter on '{}' needs at least one value",
                    field
                )));
            }
            if values.len() > max_in_filter_len {
                return Err(StoreError::invalid_argument(format!(
                    "'in' filter on '{}' has {} values, maximum is {}",
                    field,
                    values.len(),
                    max_in_filter_len
                )));
            }
        }
    }
    Ok(())
}

/// Evaluate `query` against every `(id, fields)` pair of a collection
pub fn run_query<'a, I>(docs: I, query: &Query) -> Vec<Document>
where
    I: IntoIterator<Item = (&'a String, &'a Fields)>,
{
    let mut matched: Vec<Document> = docs
        .into_iter()
        .filter(|(id, fields)| {
            query.filters.iter().all(|f| matches_filter(id, fields, f))
                && query
                    .order
                    .iter()
                    .all(|o| field_value(id, fields, &o.field).is_some())
        })
        .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
        .collect();

    matched.sort_by(|a, b| {
        for order in &query.order {
            let left = field_value(&a.id, &a.fields, &order.field);
            let right = field_value(&b.id, &b.fields, &order.field);
            let ord = match (left, right) {
                (Some(l), Some(r)) => total_cmp(&l, &r),
                _ => Ordering::Equal,
            };
            let ord = if order.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.id.cmp(&b.id)
    });

    if let Some(limit) = query.limit {
        matched.truncate(limit);
    }
    matched
}

fn field_value(id: &str, fields: &Fields, field: &str) -> Option<Value> {
    if field == DOCUMENT_ID {
        return Some(Value::String(id.to_string()));
    }
    fields.get(field).cloned()
}

fn matches_filter(id: &str, fields: &Fields, filter: &Filter) -> bool {
    let Some(actual) = field_value(id, fields, filter.field()) else {
        return false;
    };
    match filter {
        Filter::Eq(_, expected) => compare(&actual, expected) == Some(Ordering::Equal),
        Filter::Lt(_, bound) => compare(&actual, bound) == Some(Ordering::Less),
        Filter::Lte(_, bound) => matches!(
            compare(&actual, bound),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Filter::Gt(_, bound) => compare(&actual, bound) == Some(Ordering::Greater),
        Filter::Gte(_, bound) => matches!(
            compare(&actual, bound),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Filter::In(_, candidates) => candidates
            .iter()
            .any(|c| compare(&actual, c) == Some(Ordering::Equal)),
    }
}

/// Same-type comparison; `None` when the types differ
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            (a == b).then_some(Ordering::Equal)
        }
        _ => None,
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Ordering across mixed types: by type first, then by value
fn total_cmp(a: &Value, b: &Value) -> Ordering {
    compare(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn corpus() -> BTreeMap<String, Fields> {
        let mut docs = BTreeMap::new();
        docs.insert(
            "a".to_string(),
            Fields::new().with("title", "Hades").with("score", 4.5),
        );
        docs.insert(
            "b".to_string(),
            Fields::new().with("title", "Halo").with("score", 3),
        );
        docs.insert(
            "c".to_string(),
            Fields::new().with("title", "Celeste").with("score", "n/a"),
        );
        docs.insert("d".to_string(), Fields::new().with("title", "Hollow Knight"));
        docs
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_unordered_query_returns_id_order() {
        let docs = corpus();
        assert_eq!(ids(&run_query(&docs, &Query::new())), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_range_only_matches_same_type() {
        let docs = corpus();
        let q = Query::new().filter(Filter::gte("score", 3));
        assert_eq!(ids(&run_query(&docs, &q)), vec!["a", "b"]);
    }

    #[test]
    fn test_order_excludes_documents_without_field() {
        let docs = corpus();
        let q = Query::new()
            .filter(Filter::Gt("score".into(), json!(0)))
            .order_by("score", true);
        assert_eq!(ids(&run_query(&docs, &q)), vec!["a", "b"]);
    }

    #[test]
    fn test_prefix_range_with_limit() {
        let docs = corpus();
        let q = Query::new()
            .filter(Filter::gte("title", "H"))
            .filter(Filter::lte("title", "H\u{f8ff}"))
            .order_by("title", false)
            .limit(2);
        assert_eq!(ids(&run_query(&docs, &q)), vec!["a", "b"]);
    }

    #[test]
    fn test_in_filter_on_document_id() {
        let docs = corpus();
        let q = Query::new().filter(Filter::id_in(["d", "b", "zz"]));
        assert_eq!(ids(&run_query(&docs, &q)), vec!["b", "d"]);
    }

    #[test]
    fn test_in_filter_cardinality_is_bounded() {
        let q = Query::new().filter(Filter::id_in((0..11).map(|i| i.to_string())));
        assert!(check_query(&q, 10).is_err());
        assert!(check_query(&q, 11).is_ok());

        let empty = Query::new().filter(Filter::In("x".into(), vec![]));
        assert!(check_query(&empty, 10).is_err());
    }
}
