use crate::commands::{CmdMessage, CmdResult};
use crate::model::{Job, Ticket};
use crate::search::SearchOutcome;

fn messages<T>(outcome: &SearchOutcome<T>) -> Vec<CmdMessage> {
    match outcome {
        SearchOutcome::Empty => Vec::new(),
        SearchOutcome::Found { field, documents } => vec![CmdMessage::info(format!(
            "{} match(es) on {}",
            documents.len(),
            field
        ))],
        SearchOutcome::NotFound => vec![CmdMessage::warning("No matching records found.")],
        SearchOutcome::Failed(message) => vec![CmdMessage::error(message.clone())],
    }
}

pub fn tickets(outcome: SearchOutcome<Ticket>) -> CmdResult {
    let mut result = CmdResult {
        messages: messages(&outcome),
        ..CmdResult::default()
    };
    if let SearchOutcome::Found { documents, .. } = outcome {
        result.tickets = documents;
    }
    result
}

pub fn jobs(outcome: SearchOutcome<Job>) -> CmdResult {
    let mut result = CmdResult {
        messages: messages(&outcome),
        ..CmdResult::default()
    };
    if let SearchOutcome::Found { documents, .. } = outcome {
        result.jobs = documents;
    }
    result
}
