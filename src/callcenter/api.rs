//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for every call-center operation, whichever UI drives it.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Owns session state**: one [`Paginator`] per feed, the page totals per
//!   filter value, and the cached status feeds
//! - **Retries reads** that fail with a store error, up to `retry_count` times
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: That belongs in `commands/*.rs`, `paging.rs` and `search.rs`
//! - **I/O operations**: No stdout, stderr, or file formatting
//! - **Retry writes**: a failed recall or creation is reported as is
//!
//! ## Generic Over DocumentStore
//!
//! `CallCenterApi<S: DocumentStore>` is generic over the storage backend:
//! - Production: `CallCenterApi<FileStore>`
//! - Testing: `CallCenterApi<InMemoryStore>`

use crate::commands;
use crate::config::CallCenterConfig;
use crate::error::Result;
use crate::model::{Job, Ticket, TicketStatus, JOBS, TICKETS};
use crate::paging::Paginator;
use crate::search::{DebouncedSearch, SearchEngine, SearchOutcome};
use crate::store::{DocumentStore, Stored};
use crate::validation::TicketForm;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Total page count last reported for each filter value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageTotals {
    totals: HashMap<String, u32>,
}

impl PageTotals {
    pub fn record(&mut self, filter_value: &str, total_pages: u32) {
        self.totals.insert(filter_value.to_string(), total_pages);
    }

    pub fn get(&self, filter_value: &str) -> Option<u32> {
        self.totals.get(filter_value).copied()
    }
}

/// The most recently listed tickets per status, as a client would display them.
#[derive(Debug, Default)]
pub struct FeedCache {
    tickets: HashMap<TicketStatus, Vec<Stored<Ticket>>>,
}

impl FeedCache {
    pub fn store(&mut self, status: TicketStatus, tickets: Vec<Stored<Ticket>>) {
        self.tickets.insert(status, tickets);
    }

    pub fn get(&self, status: TicketStatus) -> Option<&[Stored<Ticket>]> {
        self.tickets.get(&status).map(Vec::as_slice)
    }

    /// Move a recalled ticket from the cached Closed feed to the Recalled feed.
    pub fn apply_recall(&mut self, ticket_number: &str) {
        let Some(closed) = self.tickets.get_mut(&TicketStatus::Closed) else {
            return;
        };
        let Some(pos) = closed.iter().position(|t| t.ticket_number == ticket_number) else {
            return;
        };

        let mut ticket = closed.remove(pos);
        ticket.data.ticket_status = TicketStatus::Recalled;
        self.tickets
            .entry(TicketStatus::Recalled)
            .or_default()
            .push(ticket);
    }
}

/// Run `op`, retrying up to `retries` more times while it fails with a
/// retryable error.
fn with_retry<T>(retries: u32, operation: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                warn!(operation, attempt, error = %e, "retrying after store error");
            }
            other => return other,
        }
    }
}

/// The main API facade for call-center operations.
pub struct CallCenterApi<S: DocumentStore> {
    store: S,
    data_dir: PathBuf,
    config: CallCenterConfig,
    ticket_pages: Paginator,
    invoice_pages: Paginator,
    ticket_totals: PageTotals,
    invoice_totals: PageTotals,
    feed: FeedCache,
}

impl<S: DocumentStore> CallCenterApi<S> {
    pub fn new(store: S, data_dir: PathBuf, config: CallCenterConfig) -> Self {
        Self {
            store,
            data_dir,
            config,
            ticket_pages: Paginator::new(),
            invoice_pages: Paginator::new(),
            ticket_totals: PageTotals::default(),
            invoice_totals: PageTotals::default(),
            feed: FeedCache::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &CallCenterConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn ticket_totals(&self) -> &PageTotals {
        &self.ticket_totals
    }

    pub fn invoice_totals(&self) -> &PageTotals {
        &self.invoice_totals
    }

    pub fn ticket_pages(&self) -> &Paginator {
        &self.ticket_pages
    }

    pub fn feed(&self) -> &FeedCache {
        &self.feed
    }

    pub fn list_tickets(
        &mut self,
        request: &commands::list::ListRequest,
        now: DateTime<Utc>,
    ) -> Result<commands::CmdResult> {
        let store = &self.store;
        let paginator = &mut self.ticket_pages;
        let result = with_retry(self.config.retry_count, "list tickets", || {
            commands::list::tickets(store, paginator, request, now)
        })?;

        if let Some(page) = &result.page {
            self.ticket_totals
                .record(request.status.as_str(), page.total_pages);
        }
        self.feed.store(request.status, result.tickets.clone());
        Ok(result)
    }

    pub fn list_invoices(
        &mut self,
        request: &commands::list::ListRequest,
        now: DateTime<Utc>,
    ) -> Result<commands::CmdResult> {
        let store = &self.store;
        let paginator = &mut self.invoice_pages;
        let result = with_retry(self.config.retry_count, "list invoices", || {
            commands::list::jobs(store, paginator, request, now)
        })?;

        if let Some(page) = &result.page {
            self.invoice_totals
                .record(request.status.as_str(), page.total_pages);
        }
        Ok(result)
    }

    pub fn ticket_search(&self) -> SearchEngine {
        SearchEngine::new(TICKETS, self.config.ticket_search_fields.iter().cloned())
    }

    pub fn invoice_search(&self) -> SearchEngine {
        SearchEngine::new(JOBS, self.config.invoice_search_fields.iter().cloned())
    }

    pub fn debounced_ticket_search(&self) -> DebouncedSearch {
        DebouncedSearch::new(self.ticket_search(), self.config.search_debounce())
    }

    pub fn debounced_invoice_search(&self) -> DebouncedSearch {
        DebouncedSearch::new(self.invoice_search(), self.config.search_debounce())
    }

    pub fn search_tickets(&self, text: &str) -> commands::CmdResult {
        let outcome: SearchOutcome<Ticket> = self.ticket_search().search(&self.store, text);
        commands::search::tickets(outcome)
    }

    pub fn search_invoices(&self, text: &str) -> commands::CmdResult {
        let outcome: SearchOutcome<Job> = self.invoice_search().search(&self.store, text);
        commands::search::jobs(outcome)
    }

    pub fn recall_ticket(&mut self, ticket_number: &str) -> Result<commands::CmdResult> {
        let result = commands::recall::run(&mut self.store, ticket_number)?;
        if let Some(ticket) = result.tickets.first() {
            self.feed.apply_recall(&ticket.ticket_number);
        }
        self.forget_cursors();
        Ok(result)
    }

    pub fn create_ticket(&mut self, form: TicketForm) -> Result<commands::CmdResult> {
        let result = commands::create::run(&mut self.store, form)?;
        self.forget_cursors();
        Ok(result)
    }

    pub fn reconcile(&mut self) -> Result<commands::CmdResult> {
        let result = commands::reconcile::run(&mut self.store)?;
        self.forget_cursors();
        Ok(result)
    }

    pub fn show_ticket(&self, key: &str) -> Result<commands::CmdResult> {
        with_retry(self.config.retry_count, "show ticket", || {
            commands::get::run(&self.store, key)
        })
    }

    pub fn show_invoice(&self, key: &str) -> Result<commands::CmdResult> {
        with_retry(self.config.retry_count, "show invoice", || {
            commands::get::invoice(&self.store, key)
        })
    }

    pub fn employees(&self) -> Result<commands::CmdResult> {
        with_retry(self.config.retry_count, "list employees", || {
            commands::employees::list(&self.store)
        })
    }

    pub fn technician_contact(&self, ticket_number: &str) -> Result<commands::CmdResult> {
        with_retry(self.config.retry_count, "technician contact", || {
            commands::employees::contact(&self.store, ticket_number)
        })
    }

    pub fn login(&self, username: &str, password: &str) -> Result<commands::CmdResult> {
        with_retry(self.config.retry_count, "login", || {
            commands::auth::login(&self.store, username, password)
        })
    }

    pub fn config_action(&mut self, action: ConfigAction) -> Result<commands::CmdResult> {
        let result = commands::config::run(&self.data_dir, action)?;
        if let Some(config) = &result.config {
            if config.page_size != self.config.page_size {
                self.forget_cursors();
            }
            self.config = config.clone();
        }
        Ok(result)
    }

    /// Writes can move records between pages; cached cursors would skip or
    /// repeat them.
    fn forget_cursors(&mut self) {
        self.ticket_pages.clear();
        self.invoice_pages.clear();
    }
}

pub use crate::commands::config::ConfigAction;
pub use crate::commands::list::ListRequest;
pub use commands::{CmdMessage, CmdResult, MessageLevel, PageInfo, TechnicianContact};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;

    fn api(fixture: StoreFixture) -> (CallCenterApi<InMemoryStore>, DateTime<Utc>) {
        let now = fixture.now;
        let config = CallCenterConfig {
            page_size: 2,
            ..CallCenterConfig::default()
        };
        (
            CallCenterApi::new(fixture.store, PathBuf::from("unused"), config),
            now,
        )
    }

    #[test]
    fn listing_records_totals_by_filter_value() {
        let (mut api, now) = api(StoreFixture::new()
            .with_ticket_due("A1", TicketStatus::Closed, 1)
            .with_ticket_due("A2", TicketStatus::Closed, 2)
            .with_ticket_due("A3", TicketStatus::Closed, 3)
            .with_ticket_due("O1", TicketStatus::Open, 3));

        api.list_tickets(&ListRequest::new(TicketStatus::Closed, 2), now)
            .unwrap();
        api.list_tickets(&ListRequest::new(TicketStatus::Open, 2), now)
            .unwrap();

        assert_eq!(api.ticket_totals().get("Closed"), Some(2));
        assert_eq!(api.ticket_totals().get("Open"), Some(1));
        assert_eq!(api.ticket_totals().get("Recalled"), None);
    }

    #[test]
    fn one_transient_failure_is_retried() {
        let (mut api, now) = api(StoreFixture::new().with_ticket_due("A1", TicketStatus::Open, 1));
        api.store().set_transient_failures(1);

        let result = api
            .list_tickets(&ListRequest::new(TicketStatus::Open, 2), now)
            .unwrap();
        assert_eq!(result.tickets.len(), 1);
    }

    #[test]
    fn persistent_failure_surfaces_after_retry() {
        let (mut api, now) = api(StoreFixture::new().with_ticket_due("A1", TicketStatus::Open, 1));
        api.store().set_transient_failures(2);

        let err = api
            .list_tickets(&ListRequest::new(TicketStatus::Open, 2), now)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Store);
    }

    #[test]
    fn not_found_is_not_retried() {
        let (api, _) = api(StoreFixture::new());
        let before = api.store().read_count();
        assert!(api.show_ticket("missing").is_err());
        // id lookup + ticket number lookup, once
        assert_eq!(api.store().read_count() - before, 2);
    }

    #[test]
    fn recall_moves_ticket_between_cached_feeds() {
        let (mut api, now) = api(StoreFixture::new()
            .with_billed_ticket("K1", TicketStatus::Closed, 1)
            .with_billed_ticket("K2", TicketStatus::Closed, 2));
        api.list_tickets(&ListRequest::new(TicketStatus::Closed, 10), now)
            .unwrap();

        api.recall_ticket("k1").unwrap();

        let closed = api.feed().get(TicketStatus::Closed).unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].ticket_number, "K2");
        let recalled = api.feed().get(TicketStatus::Recalled).unwrap();
        assert_eq!(recalled[0].ticket_number, "K1");
        assert_eq!(recalled[0].ticket_status, TicketStatus::Recalled);
    }

    #[test]
    fn search_uses_configured_fields() {
        let (api, _) = api(StoreFixture::new().with_billed_ticket("S9", TicketStatus::Closed, 1));
        let result = api.search_invoices("s9");
        assert_eq!(result.jobs.len(), 1);

        let missing = api.search_tickets("nothing");
        assert!(missing.tickets.is_empty());
        assert_eq!(missing.messages[0].level, MessageLevel::Warning);
    }

    #[test]
    fn page_size_change_drops_cursors() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = StoreFixture::new()
            .with_ticket_due("A1", TicketStatus::Open, 1)
            .with_ticket_due("A2", TicketStatus::Open, 2)
            .with_ticket_due("A3", TicketStatus::Open, 3)
            .with_ticket_due("A4", TicketStatus::Open, 4)
            .with_ticket_due("A5", TicketStatus::Open, 5);
        let now = fixture.now;
        let mut api = CallCenterApi::new(
            fixture.store,
            dir.path().to_path_buf(),
            CallCenterConfig {
                page_size: 2,
                ..CallCenterConfig::default()
            },
        );

        api.list_tickets(&ListRequest::new(TicketStatus::Open, 2), now)
            .unwrap();
        assert!(!api.ticket_pages().cursors().is_empty());

        api.config_action(ConfigAction::Set("page-size".into(), "3".into()))
            .unwrap();
        assert_eq!(api.config().page_size, 3);
        assert!(api.ticket_pages().cursors().is_empty());

        let request = ListRequest::new(TicketStatus::Open, api.config().page_size).page(2);
        let second = api.list_tickets(&request, now).unwrap();
        let numbers: Vec<&str> = second
            .tickets
            .iter()
            .map(|t| t.ticket_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["A4", "A5"]);
    }
}
