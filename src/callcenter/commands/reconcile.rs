use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{fields, TicketStatus, JOBS, JOB_STATUS_INSTALLING, TICKETS};
use crate::store::{patch, DocumentStore, Fields, Query, WriteBatch};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Ticket numbers whose invoice was rewritten to match the ticket.
    pub repaired: Vec<String>,
    /// Ticket numbers of invoices with no ticket at all.
    pub orphan_jobs: Vec<String>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.repaired.is_empty() && self.orphan_jobs.is_empty()
    }
}

fn text<'a>(fields: &'a Fields, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(Value::as_str)
}

/// Bring every invoice's `TicketStatus` in line with its ticket.
pub fn reconcile<S: DocumentStore>(store: &mut S) -> Result<ReconcileReport> {
    let mut ticket_status: HashMap<String, String> = HashMap::new();
    for doc in store.query(&Query::collection(TICKETS))? {
        if let (Some(number), Some(status)) = (
            text(&doc.fields, fields::TICKET_NUMBER),
            text(&doc.fields, fields::TICKET_STATUS),
        ) {
            ticket_status
                .entry(number.to_string())
                .or_insert_with(|| status.to_string());
        }
    }

    let mut report = ReconcileReport::default();
    let mut batch = WriteBatch::new();

    for job in store.query(&Query::collection(JOBS))? {
        let Some(number) = text(&job.fields, fields::TICKET_NUMBER) else {
            continue;
        };
        let Some(expected) = ticket_status.get(number) else {
            report.orphan_jobs.push(number.to_string());
            continue;
        };
        if text(&job.fields, fields::TICKET_STATUS) == Some(expected.as_str()) {
            continue;
        }

        let mut changes = patch([(fields::TICKET_STATUS, json!(expected))]);
        if expected == TicketStatus::Recalled.as_str() {
            changes.insert(fields::STATUS.to_string(), json!(JOB_STATUS_INSTALLING));
        }
        batch = batch.update(JOBS, job.id.clone(), changes);
        report.repaired.push(number.to_string());
    }

    if !batch.is_empty() {
        store.commit(batch)?;
        info!(repaired = report.repaired.len(), "reconciled invoice statuses");
    }

    Ok(report)
}

pub fn run<S: DocumentStore>(store: &mut S) -> Result<CmdResult> {
    let report = reconcile(store)?;
    let mut result = CmdResult::default();

    if report.is_clean() {
        result.add_message(CmdMessage::success("No inconsistencies found."));
        return Ok(result);
    }

    if !report.repaired.is_empty() {
        result.add_message(CmdMessage::warning("Inconsistencies found and fixed:"));
        result.add_message(CmdMessage::info(format!(
            "  - Repaired {} invoice(s) whose status diverged from the ticket: {}",
            report.repaired.len(),
            report.repaired.join(", ")
        )));
    }
    if !report.orphan_jobs.is_empty() {
        result.add_message(CmdMessage::warning(format!(
            "  - {} invoice(s) have no matching ticket: {}",
            report.orphan_jobs.len(),
            report.orphan_jobs.join(", ")
        )));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::{job, ticket, StoreFixture};

    #[test]
    fn consistent_store_needs_nothing() {
        let mut f = StoreFixture::new()
            .with_billed_ticket("R1", TicketStatus::Closed, 1)
            .with_billed_ticket("R2", TicketStatus::Open, 1);
        let commits = f.store.commit_count();

        let result = run(&mut f.store).unwrap();
        assert_eq!(result.messages[0].content, "No inconsistencies found.");
        assert_eq!(f.store.commit_count(), commits);
    }

    #[test]
    fn repairs_half_applied_recall() {
        let now = chrono::Utc::now();
        let mut f = StoreFixture::new()
            .with_ticket(ticket("R3", TicketStatus::Recalled, now))
            .with_job(job("R3", TicketStatus::Closed, now));

        let report = reconcile(&mut f.store).unwrap();
        assert_eq!(report.repaired, vec!["R3"]);

        let jobs = f.store.query(&Query::collection(JOBS)).unwrap();
        assert_eq!(jobs[0].get(fields::TICKET_STATUS).unwrap(), "Recalled");
        assert_eq!(jobs[0].get(fields::STATUS).unwrap(), "Installing");

        assert!(reconcile(&mut f.store).unwrap().is_clean());
    }

    #[test]
    fn ticket_is_authoritative_for_other_statuses() {
        let now = chrono::Utc::now();
        let mut f = StoreFixture::new()
            .with_ticket(ticket("R4", TicketStatus::Closed, now))
            .with_job(job("R4", TicketStatus::Recalled, now));

        reconcile(&mut f.store).unwrap();
        let jobs = f.store.query(&Query::collection(JOBS)).unwrap();
        assert_eq!(jobs[0].get(fields::TICKET_STATUS).unwrap(), "Closed");
        assert_eq!(jobs[0].get(fields::STATUS).unwrap(), "Completed");
    }

    #[test]
    fn reports_orphan_jobs() {
        let mut f = StoreFixture::new().with_job(job("LOST", TicketStatus::Closed, chrono::Utc::now()));
        let result = run(&mut f.store).unwrap();
        assert!(result
            .messages
            .iter()
            .any(|m| m.content.contains("LOST")));
    }
}
