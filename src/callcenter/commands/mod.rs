use crate::config::CallCenterConfig;
use crate::model::{Employee, Job, StaffUser, Ticket};
use crate::paging::{Page, PageItem};
use crate::store::Stored;

pub mod auth;
pub mod config;
pub mod create;
pub mod employees;
pub mod get;
pub mod helpers;
pub mod list;
pub mod recall;
pub mod reconcile;
pub mod search;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Position of a listing within its result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub number: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub window: Vec<PageItem>,
}

impl PageInfo {
    pub fn of<T>(page: &Page<T>) -> Self {
        Self {
            number: page.number,
            total_pages: page.total_pages,
            total_count: page.total_count,
            window: crate::paging::page_window(page.number, page.total_pages, 2),
        }
    }
}

/// Who to call about a ticket and what to tell them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnicianContact {
    pub technician: String,
    pub phone_number: Option<String>,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub tickets: Vec<Stored<Ticket>>,
    pub jobs: Vec<Stored<Job>>,
    pub employees: Vec<Stored<Employee>>,
    pub page: Option<PageInfo>,
    pub contact: Option<TechnicianContact>,
    pub user: Option<Stored<StaffUser>>,
    pub config: Option<CallCenterConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_tickets(mut self, tickets: Vec<Stored<Ticket>>) -> Self {
        self.tickets = tickets;
        self
    }

    pub fn with_jobs(mut self, jobs: Vec<Stored<Job>>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_employees(mut self, employees: Vec<Stored<Employee>>) -> Self {
        self.employees = employees;
        self
    }

    pub fn with_page(mut self, page: PageInfo) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_contact(mut self, contact: TechnicianContact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_user(mut self, user: Stored<StaffUser>) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_config(mut self, config: CallCenterConfig) -> Self {
        self.config = Some(config);
        self
    }
}
