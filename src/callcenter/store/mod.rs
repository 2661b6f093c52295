//! # Storage Layer
//!
//! This module defines the document-store abstraction the call center runs on.
//! The [`DocumentStore`] trait models a managed document database: named
//! collections of JSON documents, each with a persistent identifier.
//!
//! ## Capabilities
//!
//! The rest of the crate depends on exactly these primitives:
//! - exact-match and range filters ([`Filter`])
//! - ascending/descending ordering on one field, ties broken by document id
//! - `start_at` / `end_at` bounds on the ordered field (prefix ranges)
//! - `start_after` a [`Cursor`] (resume after a known record)
//! - `limit` and a server-side style `count`
//! - atomic batched writes ([`WriteBatch`])
//!
//! Query evaluation is shared by all backends and lives in [`query`].
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: Production storage, one JSON file per collection.
//! - [`memory::InMemoryStore`]: For tests; can simulate store failures.
//!
//! ## Storage Layout
//!
//! For `FileStore`:
//! ```text
//! <data-dir>/
//! ├── Tickets.json        # { "<id>": { ...fields }, ... }
//! ├── Jobs.json
//! ├── employees.json
//! ├── CC Staff.json
//! └── config.json         # CallCenterConfig
//! ```

use crate::error::{CallCenterError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod fs;
pub mod memory;
pub mod query;

/// The field map of one document.
pub type Fields = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// A fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: DocumentId, fields: Fields) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Position of this document in a result set ordered by `order_field`.
    pub fn cursor(&self, order_field: &str) -> Cursor {
        Cursor {
            value: self.get(order_field).cloned().unwrap_or(Value::Null),
            id: self.id.clone(),
        }
    }

    /// Deserialize into a typed record with the identifier merged in.
    pub fn into_record<T: DeserializeOwned>(self) -> Result<Stored<T>> {
        let data = serde_json::from_value(Value::Object(self.fields))?;
        Ok(Stored { id: self.id, data })
    }
}

/// A typed record together with its persistent identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stored<T> {
    pub id: DocumentId,
    #[serde(flatten)]
    pub data: T,
}

impl<T> std::ops::Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

/// Serialize a record into a document field map.
pub fn to_fields<T: Serialize>(record: &T) -> Result<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(CallCenterError::Api(format!(
            "Records must serialize to an object, got {}",
            other
        ))),
    }
}

/// The stored representation of a timestamp.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// An opaque position in an ordered result set: the order-field value of a
/// record plus its id, so equal values still have a total order.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub value: Value,
    pub id: DocumentId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gt(String, Value),
    Ge(String, Value),
    Lt(String, Value),
    Le(String, Value),
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(f, _)
            | Filter::Gt(f, _)
            | Filter::Ge(f, _)
            | Filter::Lt(f, _)
            | Filter::Le(f, _) => f,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Filter::Eq(_, v)
            | Filter::Gt(_, v)
            | Filter::Ge(_, v)
            | Filter::Lt(_, v)
            | Filter::Le(_, v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A query against one collection. Built fluently:
///
/// ```
/// use callcenter::store::Query;
/// let q = Query::collection("Tickets")
///     .where_eq("TicketStatus", "Open")
///     .order_by("ActionDate")
///     .limit(10);
/// assert_eq!(q.limit, Some(10));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub start_at: Option<Value>,
    pub end_at: Option<Value>,
    pub start_after: Option<Cursor>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order: None,
            start_at: None,
            end_at: None,
            start_after: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(field.into(), value.into()))
    }

    pub fn where_gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Gt(field.into(), value.into()))
    }

    pub fn order_by(self, field: impl Into<String>) -> Self {
        self.order_by_direction(field, Direction::Ascending)
    }

    pub fn order_by_direction(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn start_at(mut self, value: impl Into<Value>) -> Self {
        self.start_at = Some(value.into());
        self
    }

    pub fn end_at(mut self, value: impl Into<Value>) -> Self {
        self.end_at = Some(value.into());
        self
    }

    pub fn start_after(mut self, cursor: Cursor) -> Self {
        self.start_after = Some(cursor);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The same query without pagination: used for counting.
    pub fn unbounded(&self) -> Self {
        Self {
            start_after: None,
            limit: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create or fully replace a document.
    Set {
        collection: String,
        id: DocumentId,
        fields: Fields,
    },
    /// Merge `patch` into an existing document; fails if it is missing.
    Update {
        collection: String,
        id: DocumentId,
        patch: Fields,
    },
}

/// A set of writes applied all-or-nothing by [`DocumentStore::commit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, collection: &str, id: DocumentId, fields: Fields) -> Self {
        self.writes.push(Write::Set {
            collection: collection.to_string(),
            id,
            fields,
        });
        self
    }

    pub fn update(mut self, collection: &str, id: DocumentId, patch: Fields) -> Self {
        self.writes.push(Write::Update {
            collection: collection.to_string(),
            id,
            patch,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Build a field map from `(name, value)` pairs.
pub fn patch<const N: usize>(pairs: [(&str, Value); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Abstract interface for a document database.
///
/// Reads take `&self`; writes take `&mut self`. Errors from the backend are
/// reported as [`CallCenterError::Store`] and are never retried here.
pub trait DocumentStore {
    /// Insert a new document under a generated id.
    fn add(&mut self, collection: &str, fields: Fields) -> Result<DocumentId>;

    /// Get one document by id, `None` if it does not exist.
    fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>>;

    /// Run a query and return the matching documents in query order.
    fn query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Count the documents matching a query, ignoring cursors and limits.
    fn count(&self, query: &Query) -> Result<u64> {
        Ok(self.query(&query.unbounded())?.len() as u64)
    }

    /// Apply every write in the batch, or none of them.
    fn commit(&mut self, batch: WriteBatch) -> Result<()>;

    /// Merge fields into one existing document.
    fn update(&mut self, collection: &str, id: &DocumentId, patch: Fields) -> Result<()> {
        self.commit(WriteBatch::new().update(collection, id.clone(), patch))
    }
}
