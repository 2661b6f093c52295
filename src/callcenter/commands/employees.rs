use crate::commands::get::fetch_collection;
use crate::commands::helpers::{find_by_ticket_number, normalize_ticket_number};
use crate::commands::{CmdMessage, CmdResult, TechnicianContact};
use crate::error::{CallCenterError, Result};
use crate::model::{fields, Employee, Ticket, EMPLOYEES, TICKETS};
use crate::store::{DocumentStore, Query, Stored};

pub fn list<S: DocumentStore>(store: &S) -> Result<CmdResult> {
    let mut employees: Vec<Stored<Employee>> = fetch_collection(store, EMPLOYEES)?;
    employees.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(CmdResult::default().with_employees(employees))
}

/// Exact-name lookup. A blank name never matches.
pub fn find_by_name<S: DocumentStore>(store: &S, name: &str) -> Result<Option<Stored<Employee>>> {
    if name.trim().is_empty() {
        return Ok(None);
    }
    let query = Query::collection(EMPLOYEES)
        .where_eq(fields::EMPLOYEE_NAME, name)
        .limit(1);
    store
        .query(&query)?
        .into_iter()
        .next()
        .map(|doc| doc.into_record())
        .transpose()
}

pub fn recall_message(ticket_number: &str) -> String {
    format!("Ticket #{} is recalled. Please check it.", ticket_number)
}

/// Contact details of the technician assigned to a ticket.
pub fn contact<S: DocumentStore>(store: &S, ticket_number: &str) -> Result<CmdResult> {
    let number = normalize_ticket_number(ticket_number);
    let ticket: Stored<Ticket> = find_by_ticket_number(store, TICKETS, &number)?
        .ok_or_else(|| CallCenterError::NotFound("Ticket does not exist.".to_string()))?
        .into_record()?;

    let employee = find_by_name(store, &ticket.technician)?;
    let phone_number = employee.and_then(|e| e.data.phone_number);

    let mut result = CmdResult::default();
    if phone_number.is_none() {
        result.add_message(CmdMessage::warning(format!(
            "No phone number on file for {}.",
            ticket.technician
        )));
    }

    Ok(result.with_contact(TechnicianContact {
        technician: ticket.technician.clone(),
        phone_number,
        message: recall_message(&ticket.ticket_number),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TicketStatus;
    use crate::store::memory::fixtures::StoreFixture;

    #[test]
    fn blank_name_finds_nobody() {
        let f = StoreFixture::new().with_employee("Sam Ortiz", Some("5550001111"));
        assert!(find_by_name(&f.store, "  ").unwrap().is_none());
        assert_eq!(f.store.read_count(), 0);
        assert!(find_by_name(&f.store, "Sam Ortiz").unwrap().is_some());
        assert!(find_by_name(&f.store, "sam ortiz").unwrap().is_none());
    }

    #[test]
    fn contact_uses_technician_phone() {
        let f = StoreFixture::new()
            .with_employee("Sam Ortiz", Some("5550001111"))
            .with_billed_ticket("C1", TicketStatus::Recalled, 1);

        let result = contact(&f.store, "c1").unwrap();
        let contact = result.contact.unwrap();
        assert_eq!(contact.phone_number.as_deref(), Some("5550001111"));
        assert_eq!(contact.message, "Ticket #C1 is recalled. Please check it.");
        assert!(result.messages.is_empty());
    }

    #[test]
    fn contact_without_phone_warns() {
        let f = StoreFixture::new()
            .with_employee("Sam Ortiz", None)
            .with_ticket_due("C2", TicketStatus::Recalled, 1);
        let result = contact(&f.store, "C2").unwrap();
        assert!(result.contact.unwrap().phone_number.is_none());
        assert_eq!(result.messages.len(), 1);
    }

    #[test]
    fn lists_employees_by_name() {
        let f = StoreFixture::new()
            .with_employee("Zoe Hart", None)
            .with_employee("Ari Cole", None);
        let result = list(&f.store).unwrap();
        let names: Vec<_> = result.employees.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Ari Cole", "Zoe Hart"]);
    }
}
