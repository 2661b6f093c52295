//! # Paginated Query Engine
//!
//! Lists one collection filtered on a single field, ordered ascending, one
//! page at a time. Pages are located with cursors rather than offsets: page
//! `N` starts strictly after the last record of page `N - 1`.
//!
//! ## Cursor cache
//!
//! Every page fetch remembers the cursor of its last record. When page `N - 1`
//! has never been fetched, a throwaway query reads the first
//! `(N - 1) * page_size` records once and caches its last record (or the fact
//! that there was none, which makes page `N` empty).
//!
//! The cache belongs to a [`Paginator`] and is keyed by the full
//! [`QueryShape`]; two shapes never share cursors. Call
//! [`Paginator::release`] or [`Paginator::clear`] after writes that can move
//! records between pages.
//!
//! ## Expired records
//!
//! Unless a shape includes expired records, only documents whose `ActionDate`
//! is later than `now` are listed and counted. `now` is passed in by the
//! caller.

use crate::error::{CallCenterError, Result};
use crate::model::fields;
use crate::store::{timestamp_value, Cursor, DocumentStore, Query, Stored};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;

/// Everything that determines which records a listing can contain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryShape {
    pub collection: String,
    pub filter_field: String,
    pub filter_value: String,
    pub include_expired: bool,
    pub order_field: String,
}

impl QueryShape {
    /// A shape ordered by `ActionDate` that hides expired records.
    pub fn new(
        collection: impl Into<String>,
        filter_field: impl Into<String>,
        filter_value: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            filter_field: filter_field.into(),
            filter_value: filter_value.into(),
            include_expired: false,
            order_field: fields::ACTION_DATE.to_string(),
        }
    }

    pub fn include_expired(mut self, include: bool) -> Self {
        self.include_expired = include;
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_field = field.into();
        self
    }

    /// The filtered, ordered query without any pagination applied.
    pub fn base_query(&self, now: DateTime<Utc>) -> Query {
        let mut query = Query::collection(self.collection.as_str())
            .where_eq(self.filter_field.as_str(), self.filter_value.as_str());
        if !self.include_expired {
            query = query.where_gt(fields::ACTION_DATE, timestamp_value(now));
        }
        query.order_by(self.order_field.as_str())
    }
}

/// One page of typed results plus the totals for its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub number: u32,
    pub items: Vec<Stored<T>>,
    pub total_count: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `ceil(count / page_size)`.
pub fn count_pages(count: u64, page_size: usize) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = count.div_ceil(page_size as u64);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Last-record cursors per page number, per query shape and page size. `None`
/// records that the previous pages ran out of records.
#[derive(Debug, Default)]
pub struct CursorCache {
    entries: HashMap<(QueryShape, usize), HashMap<u32, Option<Cursor>>>,
}

impl CursorCache {
    pub fn get(&self, shape: &QueryShape, page_size: usize, page: u32) -> Option<&Option<Cursor>> {
        self.entries
            .get(&(shape.clone(), page_size))
            .and_then(|pages| pages.get(&page))
    }

    pub fn insert(
        &mut self,
        shape: &QueryShape,
        page_size: usize,
        page: u32,
        cursor: Option<Cursor>,
    ) {
        self.entries
            .entry((shape.clone(), page_size))
            .or_default()
            .insert(page, cursor);
    }

    /// Forget a shape's cursors at every page size.
    pub fn release(&mut self, shape: &QueryShape) {
        self.entries.retain(|(cached, _), _| cached != shape);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stateful page fetcher. Keep one per consumer for the life of a browsing
/// session so cursors can be reused.
#[derive(Debug, Default)]
pub struct Paginator {
    cursors: CursorCache,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursors(&self) -> &CursorCache {
        &self.cursors
    }

    /// Forget all cursors of one shape.
    pub fn release(&mut self, shape: &QueryShape) {
        self.cursors.release(shape);
    }

    pub fn clear(&mut self) {
        self.cursors.clear();
    }

    /// Fetch page `page` (1-based) of `shape`.
    ///
    /// Store errors propagate unchanged; nothing here retries.
    pub fn fetch_page<S, T>(
        &mut self,
        store: &S,
        shape: &QueryShape,
        page_size: usize,
        page: u32,
        now: DateTime<Utc>,
    ) -> Result<Page<T>>
    where
        S: DocumentStore,
        T: DeserializeOwned,
    {
        if page == 0 {
            return Err(CallCenterError::Api("Page numbers start at 1".to_string()));
        }
        if page_size == 0 {
            return Err(CallCenterError::Api(
                "Page size must be at least 1".to_string(),
            ));
        }

        let base = shape.base_query(now);
        let total_count = store.count(&base)?;
        let total_pages = count_pages(total_count, page_size);

        let query = if page == 1 {
            Some(base.limit(page_size))
        } else {
            self.cursor_before(store, shape, &base, page, page_size)?
                .map(|cursor| base.clone().start_after(cursor).limit(page_size))
        };

        let documents = match query {
            Some(query) => store.query(&query)?,
            None => {
                debug!(collection = %shape.collection, page, "previous pages exhausted, page is empty");
                Vec::new()
            }
        };

        if let Some(last) = documents.last() {
            self.cursors.insert(
                shape,
                page_size,
                page,
                Some(last.cursor(&shape.order_field)),
            );
        }

        debug!(
            collection = %shape.collection,
            filter = %shape.filter_value,
            page,
            returned = documents.len(),
            total_pages,
            "fetched page"
        );

        let items = documents
            .into_iter()
            .map(|doc| doc.into_record())
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            number: page,
            items,
            total_count,
            total_pages,
        })
    }

    /// Cursor after the last record of page `page - 1`, computing and caching
    /// it when unknown.
    fn cursor_before<S: DocumentStore>(
        &mut self,
        store: &S,
        shape: &QueryShape,
        base: &Query,
        page: u32,
        page_size: usize,
    ) -> Result<Option<Cursor>> {
        let previous = page - 1;
        if let Some(cached) = self.cursors.get(shape, page_size, previous) {
            debug!(collection = %shape.collection, page = previous, "cursor cache hit");
            return Ok(cached.clone());
        }

        let skip = (previous as usize).saturating_mul(page_size);
        debug!(collection = %shape.collection, page = previous, skip, "cursor cache miss");

        let cursor = store
            .query(&base.clone().limit(skip))?
            .last()
            .map(|doc| doc.cursor(&shape.order_field));
        self.cursors.insert(shape, page_size, previous, cursor.clone());
        Ok(cursor)
    }
}

/// One entry of a page navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Gap,
}

/// Navigation items around `current`: first and last page, every page within
/// `delta` of `current`, a lone skipped page filled in, longer runs collapsed
/// into a [`PageItem::Gap`].
pub fn page_window(current: u32, total: u32, delta: u32) -> Vec<PageItem> {
    let low = current.saturating_sub(delta);
    let high = current.saturating_add(delta);

    let mut items = Vec::new();
    let mut last: Option<u32> = None;

    for page in (1..=total).filter(|&p| p == 1 || p == total || (low..=high).contains(&p)) {
        if let Some(prev) = last {
            if page - prev == 2 {
                items.push(PageItem::Page(prev + 1));
            } else if page - prev > 2 {
                items.push(PageItem::Gap);
            }
        }
        items.push(PageItem::Page(page));
        last = Some(page);
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Ticket, TicketStatus, TICKETS};
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;

    fn open_shape() -> QueryShape {
        QueryShape::new(TICKETS, fields::TICKET_STATUS, "Open")
    }

    /// 7 open tickets due in 1..=7 days, 2 expired open tickets, 3 closed.
    fn seeded() -> StoreFixture {
        let mut fixture = StoreFixture::new();
        for day in 1..=7 {
            fixture = fixture.with_ticket_due(&format!("OP{}", day), TicketStatus::Open, day);
        }
        fixture
            .with_ticket_due("EX1", TicketStatus::Open, -1)
            .with_ticket_due("EX2", TicketStatus::Open, -2)
            .with_ticket_due("CL1", TicketStatus::Closed, 1)
            .with_ticket_due("CL2", TicketStatus::Closed, 2)
            .with_ticket_due("CL3", TicketStatus::Closed, 3)
    }

    fn numbers(page: &Page<Ticket>) -> Vec<String> {
        page.items.iter().map(|t| t.ticket_number.clone()).collect()
    }

    fn fetch(
        paginator: &mut Paginator,
        store: &InMemoryStore,
        shape: &QueryShape,
        size: usize,
        page: u32,
        now: DateTime<Utc>,
    ) -> Page<Ticket> {
        paginator.fetch_page(store, shape, size, page, now).unwrap()
    }

    #[test]
    fn first_page_is_bounded_filtered_and_unexpired() {
        let f = seeded();
        let mut paginator = Paginator::new();
        let page = fetch(&mut paginator, &f.store, &open_shape(), 3, 1, f.now);

        assert_eq!(numbers(&page), vec!["OP1", "OP2", "OP3"]);
        assert!(page
            .items
            .iter()
            .all(|t| t.ticket_status == TicketStatus::Open && t.action_date > f.now));
        assert_eq!(page.total_count, 7);
        assert_eq!(page.total_pages, 3);
        assert!(page.items.iter().all(|t| !t.id.as_str().is_empty()));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(count_pages(0, 10), 0);
        assert_eq!(count_pages(10, 10), 1);
        assert_eq!(count_pages(11, 10), 2);
        assert_eq!(count_pages(5, 0), 0);
    }

    #[test]
    fn no_matches_gives_zero_pages_and_empty_first_page() {
        let f = seeded();
        let mut paginator = Paginator::new();
        let shape = QueryShape::new(TICKETS, fields::TICKET_STATUS, "Recalled");
        let page = fetch(&mut paginator, &f.store, &shape, 3, 1, f.now);
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn cold_page_returns_correct_slice() {
        let f = seeded();
        let mut paginator = Paginator::new();
        let page = fetch(&mut paginator, &f.store, &open_shape(), 3, 2, f.now);
        assert_eq!(numbers(&page), vec!["OP4", "OP5", "OP6"]);

        let last = fetch(&mut paginator, &f.store, &open_shape(), 3, 3, f.now);
        assert_eq!(numbers(&last), vec!["OP7"]);
    }

    #[test]
    fn sequential_pages_reuse_cached_cursors() {
        let f = seeded();
        let mut paginator = Paginator::new();
        fetch(&mut paginator, &f.store, &open_shape(), 3, 1, f.now);
        let before = f.store.read_count();

        fetch(&mut paginator, &f.store, &open_shape(), 3, 2, f.now);
        // count + page query, no throwaway query
        assert_eq!(f.store.read_count() - before, 2);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let f = seeded();
        let mut paginator = Paginator::new();
        let page = fetch(&mut paginator, &f.store, &open_shape(), 3, 9, f.now);
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn exhausted_shape_caches_absent_cursor() {
        let f = seeded();
        let mut paginator = Paginator::new();
        let shape = QueryShape::new(TICKETS, fields::TICKET_STATUS, "Recalled");

        let page = fetch(&mut paginator, &f.store, &shape, 3, 3, f.now);
        assert!(page.is_empty());
        assert_eq!(paginator.cursors().get(&shape, 3, 2), Some(&None));

        let before = f.store.read_count();
        fetch(&mut paginator, &f.store, &shape, 3, 3, f.now);
        // count only: the absent cursor short-circuits the page query
        assert_eq!(f.store.read_count() - before, 1);
    }

    #[test]
    fn toggling_expired_does_not_mix_cursors() {
        let f = seeded();
        let mut paginator = Paginator::new();
        let hidden = open_shape();
        let shown = open_shape().include_expired(true);

        fetch(&mut paginator, &f.store, &hidden, 3, 1, f.now);
        let with_expired = fetch(&mut paginator, &f.store, &shown, 3, 1, f.now);
        assert_eq!(numbers(&with_expired), vec!["EX2", "EX1", "OP1"]);
        assert_eq!(with_expired.total_pages, 3);

        let second = fetch(&mut paginator, &f.store, &shown, 3, 2, f.now);
        assert_eq!(numbers(&second), vec!["OP2", "OP3", "OP4"]);

        let back = fetch(&mut paginator, &f.store, &hidden, 3, 2, f.now);
        assert_eq!(numbers(&back), vec!["OP4", "OP5", "OP6"]);
    }

    #[test]
    fn changing_page_size_does_not_reuse_cursors() {
        let f = seeded();
        let mut warm = Paginator::new();
        fetch(&mut warm, &f.store, &open_shape(), 3, 1, f.now);

        let resized = fetch(&mut warm, &f.store, &open_shape(), 5, 2, f.now);
        let cold = fetch(&mut Paginator::new(), &f.store, &open_shape(), 5, 2, f.now);
        assert_eq!(numbers(&resized), vec!["OP6", "OP7"]);
        assert_eq!(numbers(&resized), numbers(&cold));

        // the size-3 cursors are still there for the old size
        let third = fetch(&mut warm, &f.store, &open_shape(), 3, 2, f.now);
        assert_eq!(numbers(&third), vec!["OP4", "OP5", "OP6"]);
    }

    #[test]
    fn release_forgets_one_shape() {
        let f = seeded();
        let mut paginator = Paginator::new();
        let shown = open_shape().include_expired(true);
        fetch(&mut paginator, &f.store, &open_shape(), 3, 1, f.now);
        fetch(&mut paginator, &f.store, &shown, 3, 1, f.now);

        paginator.release(&open_shape());
        assert!(paginator.cursors().get(&open_shape(), 3, 1).is_none());
        assert!(paginator.cursors().get(&shown, 3, 1).is_some());
    }

    #[test]
    fn store_errors_propagate() {
        let mut f = seeded();
        f.store.set_simulated_failure(Some("unavailable"));
        let mut paginator = Paginator::new();
        let err = paginator
            .fetch_page::<_, Ticket>(&f.store, &open_shape(), 3, 1, f.now)
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn rejects_page_zero() {
        let f = seeded();
        let mut paginator = Paginator::new();
        assert!(paginator
            .fetch_page::<_, Ticket>(&f.store, &open_shape(), 3, 0, f.now)
            .is_err());
    }

    #[test]
    fn window_collapses_long_gaps() {
        use PageItem::{Gap, Page as P};
        assert_eq!(
            page_window(6, 12, 2),
            vec![P(1), Gap, P(4), P(5), P(6), P(7), P(8), Gap, P(12)]
        );
    }

    #[test]
    fn window_fills_single_skipped_page() {
        use PageItem::Page as P;
        assert_eq!(
            page_window(4, 7, 2),
            vec![P(1), P(2), P(3), P(4), P(5), P(6), P(7)]
        );
        assert_eq!(page_window(1, 1, 2), vec![P(1)]);
        assert!(page_window(1, 0, 2).is_empty());
    }
}
