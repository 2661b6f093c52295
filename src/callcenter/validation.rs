//! Agent-submitted ticket input and its validation rules.
//!
//! Every rule is checked and all violations are returned together as
//! [`CallCenterError::Validation`]; a valid form becomes a normalized
//! [`Ticket`] ready for insertion.

use crate::error::{CallCenterError, FieldError, Result};
use crate::model::{Ticket, TicketStatus};
use crate::text::capitalize_sentences;
use chrono::{NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").unwrap());

const DESCRIPTION_MIN: usize = 20;
const DESCRIPTION_MAX: usize = 200;

/// Raw form values as typed by an agent.
#[derive(Debug, Clone, Default)]
pub struct TicketForm {
    pub day: String,
    pub month: String,
    pub year: String,
    pub action_time: String,
    pub address: String,
    pub apartment: String,
    pub customer_name: String,
    pub phone: String,
    pub description: String,
    pub sc: String,
    pub technician: String,
    pub ticket_number: String,
}

fn required<'a>(errors: &mut Vec<FieldError>, field: &'static str, value: &'a str) -> Option<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, "Required"));
        None
    } else {
        Some(trimmed)
    }
}

fn in_range(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    min: u32,
    max: u32,
) -> Option<u32> {
    let value = required(errors, field, value)?;
    match value.parse::<u32>() {
        Ok(n) if (min..=max).contains(&n) => Some(n),
        _ => {
            errors.push(FieldError::new(
                field,
                format!("{} must be between {} and {}", field, min, max),
            ));
            None
        }
    }
}

impl TicketForm {
    /// Validate and normalize into an Open ticket.
    pub fn into_ticket(self) -> Result<Ticket> {
        let mut errors = Vec::new();

        let day = in_range(&mut errors, "Day", &self.day, 1, 31);
        let month = in_range(&mut errors, "Month", &self.month, 1, 12);
        let year = required(&mut errors, "Year", &self.year).and_then(|y| match y.parse::<i32>() {
            Ok(y) => Some(y),
            Err(_) => {
                errors.push(FieldError::new("Year", "Only numbers are allowed"));
                None
            }
        });

        let action_time = required(&mut errors, "ActionTime", &self.action_time);
        let address = required(&mut errors, "Address", &self.address);
        let apartment = required(&mut errors, "Apartment", &self.apartment);
        let customer_name = required(&mut errors, "CustomerName", &self.customer_name);
        let technician = required(&mut errors, "Technician", &self.technician);
        let ticket_number = required(&mut errors, "TicketNumber", &self.ticket_number);

        let phone = required(&mut errors, "Phone", &self.phone).and_then(|p| {
            if !DIGITS.is_match(p) {
                errors.push(FieldError::new("Phone", "Only numbers are allowed"));
                None
            } else if !PHONE.is_match(p) {
                errors.push(FieldError::new("Phone", "Invalid phone number"));
                None
            } else {
                Some(p)
            }
        });

        let description = required(&mut errors, "Description", &self.description).and_then(|d| {
            let len = d.chars().count();
            if len < DESCRIPTION_MIN {
                errors.push(FieldError::new(
                    "Description",
                    format!("Description must be at least {} characters", DESCRIPTION_MIN),
                ));
                None
            } else if len > DESCRIPTION_MAX {
                errors.push(FieldError::new("Description", "Description limit reached"));
                None
            } else {
                Some(d)
            }
        });

        let sc = required(&mut errors, "SC", &self.sc).and_then(|s| {
            if !DIGITS.is_match(s) {
                errors.push(FieldError::new("SC", "Only numbers are allowed"));
                return None;
            }
            match s.parse::<u32>() {
                Ok(n) => Some(n),
                Err(_) => {
                    errors.push(FieldError::new("SC", "Service charge is too large"));
                    None
                }
            }
        });

        let action_date = match (year, month, day) {
            (Some(y), Some(m), Some(d)) => match NaiveDate::from_ymd_opt(y, m, d) {
                Some(date) => Some(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))),
                None => {
                    errors.push(FieldError::new("Day", "Date does not exist"));
                    None
                }
            },
            _ => None,
        };

        if !errors.is_empty() {
            return Err(CallCenterError::Validation(errors));
        }

        match (
            action_date,
            action_time,
            address,
            apartment,
            customer_name,
            phone,
            description,
            sc,
            technician,
            ticket_number,
        ) {
            (
                Some(action_date),
                Some(action_time),
                Some(address),
                Some(apartment),
                Some(customer_name),
                Some(phone),
                Some(description),
                Some(sc),
                Some(technician),
                Some(ticket_number),
            ) => Ok(Ticket {
                action_date,
                action_time: action_time.to_string(),
                address: capitalize_sentences(address),
                apartment: apartment.to_string(),
                customer_name: customer_name.to_string(),
                phone: phone.to_string(),
                description: description.to_string(),
                sc,
                technician: technician.to_string(),
                ticket_number: ticket_number.to_uppercase(),
                done: false,
                ticket_status: TicketStatus::Open,
            }),
            _ => Err(CallCenterError::Api(
                "Ticket form accepted with missing fields".to_string(),
            )),
        }
    }
}
