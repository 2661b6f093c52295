//! # Search Engine
//!
//! Prefix search over an ordered list of candidate fields. Each field is tried
//! in turn with a range query `[text, text + "\u{f8ff}"]` on that field; the
//! first field with any match wins and later fields are not queried.
//!
//! Input is normalized per field the same way records are written: ticket
//! numbers are stored uppercased, free-text fields sentence-capitalized.
//!
//! [`DebouncedSearch`] wraps the engine for interactive use. Each input takes
//! a version from a [`Debouncer`]; the search runs only after the quiet period
//! and only if no newer input arrived in the meantime. Dropping the returned
//! future cancels the pending search.

use crate::model::fields;
use crate::store::{DocumentStore, Query, Stored};
use crate::text::capitalize_sentences;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound appended to a prefix to form a range query.
pub const PREFIX_SENTINEL: char = '\u{f8ff}';

/// How long input must stay unchanged before a search runs.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<T> {
    /// The input was blank; the store was not queried.
    Empty,
    Found {
        field: String,
        documents: Vec<Stored<T>>,
    },
    NotFound,
    /// The store failed; the message is meant for the user.
    Failed(String),
}

impl<T> SearchOutcome<T> {
    pub fn documents(&self) -> &[Stored<T>] {
        match self {
            SearchOutcome::Found { documents, .. } => documents,
            _ => &[],
        }
    }
}

/// Value to look up in `field` for the raw input `text`.
pub fn normalize(field: &str, text: &str) -> String {
    if field == fields::TICKET_NUMBER {
        text.trim().to_uppercase()
    } else {
        capitalize_sentences(text)
    }
}

#[derive(Debug, Clone)]
pub struct SearchEngine {
    collection: String,
    fields: Vec<String>,
}

impl SearchEngine {
    pub fn new<I, F>(collection: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        Self {
            collection: collection.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn search<S, T>(&self, store: &S, text: &str) -> SearchOutcome<T>
    where
        S: DocumentStore,
        T: DeserializeOwned,
    {
        if text.trim().is_empty() {
            return SearchOutcome::Empty;
        }

        for field in &self.fields {
            let value = normalize(field, text);
            let query = Query::collection(self.collection.as_str())
                .order_by(field.as_str())
                .start_at(value.as_str())
                .end_at(format!("{}{}", value, PREFIX_SENTINEL));

            debug!(collection = %self.collection, field = %field, prefix = %value, "prefix query");

            let documents = match store.query(&query) {
                Ok(documents) => documents,
                Err(e) => {
                    warn!(collection = %self.collection, error = %e, "search failed");
                    return SearchOutcome::Failed(e.to_string());
                }
            };
            if documents.is_empty() {
                continue;
            }

            let records = documents
                .into_iter()
                .map(|doc| doc.into_record())
                .collect::<crate::error::Result<Vec<_>>>();
            return match records {
                Ok(documents) => SearchOutcome::Found {
                    field: field.clone(),
                    documents,
                },
                Err(e) => SearchOutcome::Failed(e.to_string()),
            };
        }

        SearchOutcome::NotFound
    }
}

/// A version handed out for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

/// Hands out increasing versions; only the latest one is current.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    latest: AtomicU64,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            latest: AtomicU64::new(0),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Register a new input, superseding every earlier ticket.
    pub fn begin(&self) -> SearchTicket {
        SearchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Wait out the quiet period; `true` if `ticket` is still the latest.
    pub async fn settle(&self, ticket: SearchTicket) -> bool {
        tokio::time::sleep(self.quiet).await;
        self.is_current(ticket)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Debounced<T> {
    Ready(T),
    /// A newer input arrived; this result must not be shown.
    Superseded,
}

/// A [`SearchEngine`] behind a [`Debouncer`].
#[derive(Debug)]
pub struct DebouncedSearch {
    engine: SearchEngine,
    debouncer: Debouncer,
}

impl DebouncedSearch {
    pub fn new(engine: SearchEngine, quiet: Duration) -> Self {
        Self {
            engine,
            debouncer: Debouncer::new(quiet),
        }
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Run `text` once the input has been quiet, unless superseded.
    pub async fn run<S, T>(&self, store: &S, text: &str) -> Debounced<SearchOutcome<T>>
    where
        S: DocumentStore,
        T: DeserializeOwned,
    {
        let ticket = self.debouncer.begin();

        if text.trim().is_empty() {
            return Debounced::Ready(SearchOutcome::Empty);
        }

        if !self.debouncer.settle(ticket).await {
            debug!(input = %text, "search superseded before running");
            return Debounced::Superseded;
        }

        let outcome = self.engine.search(store, text);

        if !self.debouncer.is_current(ticket) {
            debug!(input = %text, "discarding stale search result");
            return Debounced::Superseded;
        }
        Debounced::Ready(outcome)
    }
}
