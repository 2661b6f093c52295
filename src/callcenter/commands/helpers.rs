use crate::error::Result;
use crate::model::fields;
use crate::store::{Document, DocumentStore, Query};

/// Ticket numbers are stored uppercased; lookups normalize the same way.
pub fn normalize_ticket_number(input: &str) -> String {
    input.trim().to_uppercase()
}

/// First document of `collection` whose `TicketNumber` equals `number`.
pub fn find_by_ticket_number<S: DocumentStore>(
    store: &S,
    collection: &str,
    number: &str,
) -> Result<Option<Document>> {
    let query = Query::collection(collection)
        .where_eq(fields::TICKET_NUMBER, number)
        .limit(1);
    Ok(store.query(&query)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TicketStatus, TICKETS};
    use crate::store::memory::fixtures::StoreFixture;

    #[test]
    fn finds_exact_number_only() {
        let f = StoreFixture::new()
            .with_ticket_due("TN1", TicketStatus::Open, 1)
            .with_ticket_due("TN10", TicketStatus::Open, 1);

        let doc = find_by_ticket_number(&f.store, TICKETS, "TN1").unwrap().unwrap();
        assert_eq!(doc.get(fields::TICKET_NUMBER).unwrap(), "TN1");
        assert!(find_by_ticket_number(&f.store, TICKETS, "TN")
            .unwrap()
            .is_none());
    }

    #[test]
    fn normalizes_input() {
        assert_eq!(normalize_ticket_number("  tn-42 "), "TN-42");
    }
}
