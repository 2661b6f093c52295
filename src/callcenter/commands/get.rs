use crate::commands::helpers::{find_by_ticket_number, normalize_ticket_number};
use crate::commands::CmdResult;
use crate::error::{CallCenterError, Result};
use crate::model::{Job, Ticket, JOBS, TICKETS};
use crate::store::{DocumentId, DocumentStore, Query, Stored};
use serde::de::DeserializeOwned;

/// One document by id, with the id merged in.
pub fn fetch_document<S, T>(store: &S, collection: &str, id: &DocumentId) -> Result<Stored<T>>
where
    S: DocumentStore,
    T: DeserializeOwned,
{
    store
        .get(collection, id)?
        .ok_or_else(|| {
            CallCenterError::NotFound(format!(
                "Document with ID \"{}\" not found in \"{}\"",
                id, collection
            ))
        })?
        .into_record()
}

/// Every document of a collection.
pub fn fetch_collection<S, T>(store: &S, collection: &str) -> Result<Vec<Stored<T>>>
where
    S: DocumentStore,
    T: DeserializeOwned,
{
    store
        .query(&Query::collection(collection))?
        .into_iter()
        .map(|doc| doc.into_record())
        .collect()
}

/// Resolve `key` as a document id first, then as a ticket number.
fn lookup<S, T>(store: &S, collection: &str, key: &str, missing: &str) -> Result<Stored<T>>
where
    S: DocumentStore,
    T: DeserializeOwned,
{
    if let Some(doc) = store.get(collection, &DocumentId::from(key.trim()))? {
        return doc.into_record();
    }
    find_by_ticket_number(store, collection, &normalize_ticket_number(key))?
        .ok_or_else(|| CallCenterError::NotFound(missing.to_string()))?
        .into_record()
}

/// A ticket with its invoice, when one exists.
pub fn run<S: DocumentStore>(store: &S, key: &str) -> Result<CmdResult> {
    let ticket: Stored<Ticket> = lookup(store, TICKETS, key, "Ticket does not exist.")?;
    let number = normalize_ticket_number(&ticket.ticket_number);
    let jobs: Vec<Stored<Job>> = match find_by_ticket_number(store, JOBS, &number)? {
        Some(doc) => vec![doc.into_record()?],
        None => Vec::new(),
    };
    Ok(CmdResult::default()
        .with_tickets(vec![ticket])
        .with_jobs(jobs))
}

/// An invoice by id or ticket number.
pub fn invoice<S: DocumentStore>(store: &S, key: &str) -> Result<CmdResult> {
    let job: Stored<Job> = lookup(store, JOBS, key, "Invoice does not exist.")?;
    Ok(CmdResult::default().with_jobs(vec![job]))
}
