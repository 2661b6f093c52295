use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{fields, StaffUser, STAFF};
use crate::store::{DocumentStore, Query, Stored};
use tracing::debug;

/// The staff account with this username, if the password matches.
pub fn find_user<S: DocumentStore>(
    store: &S,
    username: &str,
    password: &str,
) -> Result<Option<Stored<StaffUser>>> {
    let query = Query::collection(STAFF)
        .where_eq(fields::USERNAME, username)
        .limit(1);
    let Some(doc) = store.query(&query)?.into_iter().next() else {
        debug!(username, "unknown username");
        return Ok(None);
    };

    let user: Stored<StaffUser> = doc.into_record()?;
    if user.password != password {
        debug!(username, "password mismatch");
        return Ok(None);
    }
    Ok(Some(user))
}

pub fn login<S: DocumentStore>(store: &S, username: &str, password: &str) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    match find_user(store, username.trim(), password)? {
        Some(user) => {
            let greeting = match user.first_name() {
                Some(first) => format!("Welcome back, {}!", first),
                None => "Welcome back!".to_string(),
            };
            result.add_message(CmdMessage::success(greeting));
            Ok(result.with_user(user))
        }
        None => {
            result.add_message(CmdMessage::error("Invalid username or password."));
            Ok(result)
        }
    }
}
