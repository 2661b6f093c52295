use crate::commands::{CmdResult, PageInfo};
use crate::error::Result;
use crate::model::{fields, Job, Ticket, TicketStatus, JOBS, TICKETS};
use crate::paging::{Page, Paginator, QueryShape};
use crate::store::DocumentStore;
use chrono::{DateTime, Utc};

/// Which slice of a status listing to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRequest {
    pub status: TicketStatus,
    pub include_expired: bool,
    pub page: u32,
    pub page_size: usize,
}

impl ListRequest {
    pub fn new(status: TicketStatus, page_size: usize) -> Self {
        Self {
            status,
            include_expired: false,
            page: 1,
            page_size,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn include_expired(mut self, include: bool) -> Self {
        self.include_expired = include;
        self
    }

    pub fn shape(&self, collection: &str) -> QueryShape {
        QueryShape::new(collection, fields::TICKET_STATUS, self.status.as_str())
            .include_expired(self.include_expired)
    }
}

pub fn ticket_page<S: DocumentStore>(
    store: &S,
    paginator: &mut Paginator,
    request: &ListRequest,
    now: DateTime<Utc>,
) -> Result<Page<Ticket>> {
    paginator.fetch_page(store, &request.shape(TICKETS), request.page_size, request.page, now)
}

pub fn job_page<S: DocumentStore>(
    store: &S,
    paginator: &mut Paginator,
    request: &ListRequest,
    now: DateTime<Utc>,
) -> Result<Page<Job>> {
    paginator.fetch_page(store, &request.shape(JOBS), request.page_size, request.page, now)
}

pub fn tickets<S: DocumentStore>(
    store: &S,
    paginator: &mut Paginator,
    request: &ListRequest,
    now: DateTime<Utc>,
) -> Result<CmdResult> {
    let page = ticket_page(store, paginator, request, now)?;
    let info = PageInfo::of(&page);
    Ok(CmdResult::default().with_tickets(page.items).with_page(info))
}

pub fn jobs<S: DocumentStore>(
    store: &S,
    paginator: &mut Paginator,
    request: &ListRequest,
    now: DateTime<Utc>,
) -> Result<CmdResult> {
    let page = job_page(store, paginator, request, now)?;
    let info = PageInfo::of(&page);
    Ok(CmdResult::default().with_jobs(page.items).with_page(info))
}
