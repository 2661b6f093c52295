use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CallCenterError;

/// Collection holding one document per service ticket.
pub const TICKETS: &str = "Tickets";
/// Collection holding the billing-facing invoice records.
pub const JOBS: &str = "Jobs";
pub const EMPLOYEES: &str = "employees";
pub const STAFF: &str = "CC Staff";

/// Document field names as they are persisted.
pub mod fields {
    pub const TICKET_NUMBER: &str = "TicketNumber";
    pub const TICKET_STATUS: &str = "TicketStatus";
    pub const STATUS: &str = "Status";
    pub const ACTION_DATE: &str = "ActionDate";
    pub const ADDRESS: &str = "Address";
    pub const EMPLOYEE_NAME: &str = "name";
    pub const USERNAME: &str = "username";
}

/// Workflow status a Job is put back into once its ticket is recalled.
pub const JOB_STATUS_INSTALLING: &str = "Installing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    Closed,
    Recalled,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [
        TicketStatus::Open,
        TicketStatus::Closed,
        TicketStatus::Recalled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Closed => "Closed",
            TicketStatus::Recalled => "Recalled",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = CallCenterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "closed" => Ok(TicketStatus::Closed),
            "recalled" => Ok(TicketStatus::Recalled),
            other => Err(CallCenterError::Api(format!(
                "Unknown ticket status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ticket {
    pub action_date: DateTime<Utc>,
    pub action_time: String,
    pub address: String,
    pub apartment: String,
    pub customer_name: String,
    pub phone: String,
    pub description: String,
    /// Service-charge code.
    #[serde(rename = "SC")]
    pub sc: u32,
    pub technician: String,
    pub ticket_number: String,
    pub done: bool,
    pub ticket_status: TicketStatus,
}

/// The invoice counterpart of a [`Ticket`], keyed by the same ticket number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
    pub action_date: DateTime<Utc>,
    #[serde(default)]
    pub action_time: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub apartment: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technician: String,
    pub ticket_number: String,
    pub ticket_status: TicketStatus,
    /// Coarse workflow status, e.g. "Installing".
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub number_of_parts: u32,
    #[serde(default)]
    pub parts_cost: f64,
    #[serde(default)]
    pub payment_type: String,
    #[serde(default)]
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(rename = "WorkShare", default)]
    pub work_share: String,
    #[serde(rename = "PhoneNumber", default)]
    pub phone_number: Option<String>,
}

/// A call-center agent account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffUser {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for StaffUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaffUser")
            .field("name", &self.name)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl StaffUser {
    /// First name, capitalized, for greetings.
    pub fn first_name(&self) -> Option<String> {
        let first = self.name.as_deref()?.split_whitespace().next()?;
        let mut chars = first.chars();
        let head = chars.next()?;
        Some(head.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect())
    }
}
