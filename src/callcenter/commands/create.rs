use crate::commands::helpers::find_by_ticket_number;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CallCenterError, Result};
use crate::model::TICKETS;
use crate::store::{to_fields, DocumentStore, Stored};
use crate::validation::TicketForm;
use tracing::info;

pub const DUPLICATE_NUMBER: &str = "Ticket number already exists. Please use a different one.";

pub fn run<S: DocumentStore>(store: &mut S, form: TicketForm) -> Result<CmdResult> {
    let ticket = form.into_ticket()?;

    if find_by_ticket_number(store, TICKETS, &ticket.ticket_number)?.is_some() {
        return Err(CallCenterError::Precondition(DUPLICATE_NUMBER.to_string()));
    }

    let id = store.add(TICKETS, to_fields(&ticket)?)?;
    info!(ticket = %ticket.ticket_number, id = %id, "ticket created");

    let mut result = CmdResult::default().with_tickets(vec![Stored { id, data: ticket }]);
    result.add_message(CmdMessage::success("Ticket successfully created!"));
    Ok(result)
}
