//! Query evaluation shared by every backend.
//!
//! Values are compared with a total order over JSON types, modelled on how
//! managed document stores order mixed-type fields:
//!
//! `null < bool < number < timestamp < string < array < object`
//!
//! A string is a timestamp when it parses as RFC 3339, so stored dates compare
//! chronologically regardless of their fractional-second precision. Range
//! filters only match values of the same type as the bound; ordering on a
//! field excludes documents that lack it.

use super::{Cursor, Direction, Document, DocumentId, Fields, Filter, Query};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::cmp::Ordering;

fn as_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(s) if as_timestamp(s).is_some() => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    }
}

/// Total order over stored values.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let (rank_a, rank_b) = (type_rank(a), type_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => match (as_timestamp(x), as_timestamp(y)) {
            (Some(tx), Some(ty)) => tx.cmp(&ty),
            _ => x.cmp(y),
        },
        (Value::Array(x), Value::Array(y)) => {
            for (ix, iy) in x.iter().zip(y.iter()) {
                let ord = compare_values(ix, iy);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
        _ => Ordering::Equal,
    }
}

fn accepts(filter: &Filter, ord: Ordering) -> bool {
    match filter {
        Filter::Eq(..) => ord == Ordering::Equal,
        Filter::Gt(..) => ord == Ordering::Greater,
        Filter::Ge(..) => ord != Ordering::Less,
        Filter::Lt(..) => ord == Ordering::Less,
        Filter::Le(..) => ord != Ordering::Greater,
    }
}

fn matches_filter(fields: &Fields, filter: &Filter) -> bool {
    let Some(actual) = fields.get(filter.field()) else {
        return false;
    };
    let bound = filter.value();

    type_rank(actual) == type_rank(bound) && accepts(filter, compare_values(actual, bound))
}

/// Ordering key of a document under `query`'s sort: order-field value, then id.
fn sort_key<'a>(
    doc: &'a Document,
    order_field: Option<&str>,
) -> (Option<&'a Value>, &'a DocumentId) {
    (order_field.and_then(|f| doc.get(f)), &doc.id)
}

fn compare_keys(
    a: (Option<&Value>, &DocumentId),
    b: (Option<&Value>, &DocumentId),
    direction: Direction,
) -> Ordering {
    let ord = match (a.0, b.0) {
        (Some(x), Some(y)) => compare_values(x, y),
        _ => Ordering::Equal,
    }
    .then_with(|| a.1.cmp(b.1));

    match direction {
        Direction::Ascending => ord,
        Direction::Descending => ord.reverse(),
    }
}

/// Evaluate `query` over the documents of its collection.
pub fn execute<'a, I>(documents: I, query: &Query) -> Vec<Document>
where
    I: IntoIterator<Item = (&'a DocumentId, &'a Fields)>,
{
    let order_field = query.order.as_ref().map(|o| o.field.as_str());
    let direction = query
        .order
        .as_ref()
        .map(|o| o.direction)
        .unwrap_or_default();

    let mut results: Vec<Document> = documents
        .into_iter()
        .filter(|(_, fields)| query.filters.iter().all(|f| matches_filter(fields, f)))
        .filter(|(_, fields)| order_field.map_or(true, |f| fields.contains_key(f)))
        .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
        .collect();

    results.sort_by(|a, b| {
        compare_keys(
            sort_key(a, order_field),
            sort_key(b, order_field),
            direction,
        )
    });

    if let Some(field) = order_field {
        let directed = |ord: Ordering| match direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        };

        if let Some(start) = &query.start_at {
            results.retain(|doc| {
                doc.get(field)
                    .is_some_and(|v| directed(compare_values(v, start)) != Ordering::Less)
            });
        }
        if let Some(end) = &query.end_at {
            results.retain(|doc| {
                doc.get(field)
                    .is_some_and(|v| directed(compare_values(v, end)) != Ordering::Greater)
            });
        }
    }

    if let Some(Cursor { value, id }) = &query.start_after {
        let cursor_key = (order_field.map(|_| value), id);
        results.retain(|doc| {
            compare_keys(sort_key(doc, order_field), cursor_key, direction) == Ordering::Greater
        });
    }

    if let Some(limit) = query.limit {
        results.truncate(limit);
    }

    results
}
