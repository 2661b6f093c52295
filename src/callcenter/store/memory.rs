use super::{query, Document, DocumentId, DocumentStore, Fields, Query, Write, WriteBatch};
use crate::error::{CallCenterError, Result};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

/// In-memory storage for testing and development.
/// Does NOT persist data.
///
/// Uses `Cell` counters so reads can be observed through `&self`; the store is
/// single-threaded like the rest of the core.
#[derive(Default)]
pub struct InMemoryStore {
    collections: HashMap<String, BTreeMap<DocumentId, Fields>>,
    simulated_failure: Option<String>,
    transient_failures: Cell<usize>,
    simulate_write_error: bool,
    reads: Cell<usize>,
    commits: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a store error carrying `message`.
    pub fn set_simulated_failure(&mut self, message: Option<&str>) {
        self.simulated_failure = message.map(str::to_string);
    }

    /// Fail the next `count` calls, then behave normally again.
    pub fn set_transient_failures(&self, count: usize) {
        self.transient_failures.set(count);
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&mut self, simulate: bool) {
        self.simulate_write_error = simulate;
    }

    /// Number of read calls (get, query, count) served or attempted.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    /// Number of batches successfully committed.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    fn check_available(&self) -> Result<()> {
        if let Some(message) = &self.simulated_failure {
            return Err(CallCenterError::Store(message.clone()));
        }
        let pending = self.transient_failures.get();
        if pending > 0 {
            self.transient_failures.set(pending - 1);
            return Err(CallCenterError::Store("Simulated transient failure".to_string()));
        }
        Ok(())
    }

    fn begin_read(&self) -> Result<()> {
        self.reads.set(self.reads.get() + 1);
        self.check_available()
    }
}

/// Apply a batch to a copy of the collections so a failing write leaves the
/// original untouched. Shared with the file store.
pub(crate) fn apply_batch(
    collections: &HashMap<String, BTreeMap<DocumentId, Fields>>,
    batch: WriteBatch,
) -> Result<HashMap<String, BTreeMap<DocumentId, Fields>>> {
    let mut staged = collections.clone();

    for write in batch.into_writes() {
        match write {
            Write::Set {
                collection,
                id,
                fields,
            } => {
                staged.entry(collection).or_default().insert(id, fields);
            }
            Write::Update {
                collection,
                id,
                patch,
            } => {
                let doc = staged
                    .get_mut(&collection)
                    .and_then(|docs| docs.get_mut(&id))
                    .ok_or_else(|| {
                        CallCenterError::NotFound(format!(
                            "Document with ID \"{}\" not found in \"{}\"",
                            id, collection
                        ))
                    })?;
                doc.extend(patch);
            }
        }
    }

    Ok(staged)
}

impl DocumentStore for InMemoryStore {
    fn add(&mut self, collection: &str, fields: Fields) -> Result<DocumentId> {
        let id = DocumentId::generate();
        self.commit(WriteBatch::new().set(collection, id.clone(), fields))?;
        Ok(id)
    }

    fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>> {
        self.begin_read()?;
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id.clone(), fields.clone())))
    }

    fn query(&self, query: &Query) -> Result<Vec<Document>> {
        self.begin_read()?;
        Ok(match self.collections.get(&query.collection) {
            Some(docs) => query::execute(docs, query),
            None => Vec::new(),
        })
    }

    fn count(&self, query: &Query) -> Result<u64> {
        self.begin_read()?;
        Ok(match self.collections.get(&query.collection) {
            Some(docs) => query::execute(docs, &query.unbounded()).len() as u64,
            None => 0,
        })
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<()> {
        self.check_available()?;
        if self.simulate_write_error {
            return Err(CallCenterError::Store("Simulated write error".to_string()));
        }
        self.collections = apply_batch(&self.collections, batch)?;
        self.commits += 1;
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{
        Employee, Job, StaffUser, Ticket, TicketStatus, EMPLOYEES, JOBS, STAFF, TICKETS,
    };
    use crate::store::to_fields;
    use chrono::{DateTime, Duration, Utc};

    /// A fully populated ticket for tests.
    pub fn ticket(number: &str, status: TicketStatus, action_date: DateTime<Utc>) -> Ticket {
        Ticket {
            action_date,
            action_time: "9am-12pm".to_string(),
            address: format!("{} Main st", number.to_lowercase()),
            apartment: "2A".to_string(),
            customer_name: "Jordan Reyes".to_string(),
            phone: "5551234567".to_string(),
            description: "Refrigerator is not cooling on the top shelf".to_string(),
            sc: 89,
            technician: "Sam Ortiz".to_string(),
            ticket_number: number.to_string(),
            done: false,
            ticket_status: status,
        }
    }

    /// The invoice counterpart of [`ticket`].
    pub fn job(number: &str, status: TicketStatus, action_date: DateTime<Utc>) -> Job {
        Job {
            action_date,
            action_time: "9am-12pm".to_string(),
            address: format!("{} Main st", number.to_lowercase()),
            apartment: "2A".to_string(),
            customer_name: "Jordan Reyes".to_string(),
            phone: "5551234567".to_string(),
            description: "Refrigerator is not cooling on the top shelf".to_string(),
            technician: "Sam Ortiz".to_string(),
            ticket_number: number.to_string(),
            ticket_status: status,
            status: "Completed".to_string(),
            number_of_parts: 2,
            parts_cost: 48.5,
            payment_type: "Card".to_string(),
            total_price: 180.0,
        }
    }

    pub struct StoreFixture {
        pub store: InMemoryStore,
        pub now: DateTime<Utc>,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
                now: Utc::now(),
            }
        }

        pub fn with_ticket(mut self, ticket: Ticket) -> Self {
            let fields = to_fields(&ticket).unwrap();
            self.store.add(TICKETS, fields).unwrap();
            self
        }

        pub fn with_job(mut self, job: Job) -> Self {
            let fields = to_fields(&job).unwrap();
            self.store.add(JOBS, fields).unwrap();
            self
        }

        /// A ticket due `days_ahead` days from the fixture's `now`
        /// (negative for expired ones).
        pub fn with_ticket_due(self, number: &str, status: TicketStatus, days_ahead: i64) -> Self {
            let due = self.now + Duration::days(days_ahead);
            self.with_ticket(ticket(number, status, due))
        }

        /// A ticket plus its matching job, both in `status`.
        pub fn with_billed_ticket(self, number: &str, status: TicketStatus, days_ahead: i64) -> Self {
            let due = self.now + Duration::days(days_ahead);
            self.with_ticket(ticket(number, status, due))
                .with_job(job(number, status, due))
        }

        pub fn with_employee(mut self, name: &str, phone: Option<&str>) -> Self {
            let employee = Employee {
                name: name.to_string(),
                username: name.to_lowercase().replace(' ', "."),
                work_share: "50".to_string(),
                phone_number: phone.map(str::to_string),
            };
            self.store
                .add(EMPLOYEES, to_fields(&employee).unwrap())
                .unwrap();
            self
        }

        pub fn with_staff_user(mut self, name: &str, username: &str, password: &str) -> Self {
            let user = StaffUser {
                name: Some(name.to_string()),
                username: username.to_string(),
                password: password.to_string(),
            };
            self.store.add(STAFF, to_fields(&user).unwrap()).unwrap();
            self
        }
    }
}
