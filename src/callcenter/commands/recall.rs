//! Closed → Recalled transition for a ticket and its invoice.
//!
//! All preconditions are checked before anything is written, then both
//! documents change in one atomic batch.

use crate::commands::helpers::{find_by_ticket_number, normalize_ticket_number};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CallCenterError, Result};
use crate::model::{fields, Job, Ticket, TicketStatus, JOBS, JOB_STATUS_INSTALLING, TICKETS};
use crate::store::{patch, DocumentStore, Stored, WriteBatch};
use serde_json::json;
use tracing::info;

pub const TICKET_MISSING: &str = "Ticket does not exist.";
pub const NOT_CLOSED: &str = "Only closed tickets can be recalled.";
pub const JOB_MISSING: &str = "Matching job not found for the ticket.";

pub fn run<S: DocumentStore>(store: &mut S, ticket_number: &str) -> Result<CmdResult> {
    let number = normalize_ticket_number(ticket_number);

    let ticket_doc = find_by_ticket_number(store, TICKETS, &number)?
        .ok_or_else(|| CallCenterError::NotFound(TICKET_MISSING.to_string()))?;
    let mut ticket: Stored<Ticket> = ticket_doc.into_record()?;

    if ticket.ticket_status != TicketStatus::Closed {
        return Err(CallCenterError::Precondition(NOT_CLOSED.to_string()));
    }

    let job_doc = find_by_ticket_number(store, JOBS, &number)?
        .ok_or_else(|| CallCenterError::NotFound(JOB_MISSING.to_string()))?;
    let mut job: Stored<Job> = job_doc.into_record()?;

    let recalled = json!(TicketStatus::Recalled.as_str());
    let batch = WriteBatch::new()
        .update(
            TICKETS,
            ticket.id.clone(),
            patch([(fields::TICKET_STATUS, recalled.clone())]),
        )
        .update(
            JOBS,
            job.id.clone(),
            patch([
                (fields::TICKET_STATUS, recalled),
                (fields::STATUS, json!(JOB_STATUS_INSTALLING)),
            ]),
        );
    store.commit(batch)?;

    info!(ticket = %number, ticket_id = %ticket.id, job_id = %job.id, "ticket recalled");

    ticket.data.ticket_status = TicketStatus::Recalled;
    job.data.ticket_status = TicketStatus::Recalled;
    job.data.status = JOB_STATUS_INSTALLING.to_string();

    let mut result = CmdResult::default()
        .with_tickets(vec![ticket])
        .with_jobs(vec![job]);
    result.add_message(CmdMessage::success(format!(
        "TN-{} ticket is recalled",
        number
    )));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::{Document, Query};

    fn document(store: &impl DocumentStore, collection: &str, number: &str) -> Document {
        store
            .query(&Query::collection(collection).where_eq(fields::TICKET_NUMBER, number))
            .unwrap()
            .remove(0)
    }

    #[test]
    fn recalls_closed_ticket_and_its_job() {
        let mut f = StoreFixture::new().with_billed_ticket("TN7", TicketStatus::Closed, 3);

        let result = run(&mut f.store, "TN7").unwrap();
        assert_eq!(result.tickets[0].ticket_status, TicketStatus::Recalled);
        assert_eq!(result.messages[0].content, "TN-TN7 ticket is recalled");

        let ticket = document(&f.store, TICKETS, "TN7");
        assert_eq!(ticket.get(fields::TICKET_STATUS).unwrap(), "Recalled");
        let job = document(&f.store, JOBS, "TN7");
        assert_eq!(job.get(fields::TICKET_STATUS).unwrap(), "Recalled");
        assert_eq!(job.get(fields::STATUS).unwrap(), "Installing");
        assert_eq!(f.store.commit_count(), 3);
    }

    #[test]
    fn input_is_trimmed_and_uppercased() {
        let mut f = StoreFixture::new().with_billed_ticket("TN8", TicketStatus::Closed, 3);
        assert!(run(&mut f.store, "  tn8 ").is_ok());
    }

    #[test]
    fn unknown_ticket_is_not_found() {
        let mut f = StoreFixture::new();
        let err = run(&mut f.store, "NOPE").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), TICKET_MISSING);
    }

    #[test]
    fn open_ticket_fails_without_writes() {
        let mut f = StoreFixture::new().with_billed_ticket("TN1", TicketStatus::Open, 3);
        let commits = f.store.commit_count();

        let err = run(&mut f.store, "TN1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(err.to_string(), NOT_CLOSED);
        assert_eq!(f.store.commit_count(), commits);
    }

    #[test]
    fn missing_job_fails_without_writes() {
        let mut f = StoreFixture::new().with_ticket_due("TN2", TicketStatus::Closed, 3);
        let commits = f.store.commit_count();

        let err = run(&mut f.store, "TN2").unwrap_err();
        assert_eq!(err.to_string(), JOB_MISSING);
        assert_eq!(f.store.commit_count(), commits);
        let ticket = document(&f.store, TICKETS, "TN2");
        assert_eq!(ticket.get(fields::TICKET_STATUS).unwrap(), "Closed");
    }

    #[test]
    fn recalled_ticket_cannot_be_recalled_again() {
        let mut f = StoreFixture::new().with_billed_ticket("TN3", TicketStatus::Closed, 3);
        run(&mut f.store, "TN3").unwrap();

        for _ in 0..2 {
            let err = run(&mut f.store, "TN3").unwrap_err();
            assert_eq!(err.to_string(), NOT_CLOSED);
        }
    }

    #[test]
    fn write_failure_changes_neither_record() {
        let mut f = StoreFixture::new().with_billed_ticket("TN4", TicketStatus::Closed, 3);
        f.store.set_simulate_write_error(true);

        let err = run(&mut f.store, "TN4").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Store);

        let ticket = document(&f.store, TICKETS, "TN4");
        let job = document(&f.store, JOBS, "TN4");
        assert_eq!(ticket.get(fields::TICKET_STATUS).unwrap(), "Closed");
        assert_eq!(job.get(fields::TICKET_STATUS).unwrap(), "Closed");
        assert_eq!(job.get(fields::STATUS).unwrap(), "Completed");
    }
}
