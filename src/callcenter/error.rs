use thiserror::Error;

/// A single failed validation rule on an agent-submitted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug)]
pub enum CallCenterError {
    /// A record is absent for the given key. The message is user-facing.
    #[error("{0}")]
    NotFound(String),

    /// A state transition was attempted from the wrong prior state.
    #[error("{0}")]
    Precondition(String),

    /// The backing store itself failed (connectivity, permissions, quota).
    #[error("Store error: {0}")]
    Store(String),

    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Api Error: {0}")]
    Api(String),
}

/// Coarse classification used by callers to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Precondition,
    Store,
    /// A stored record or config file could not be decoded.
    Data,
    Validation,
}

impl CallCenterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CallCenterError::NotFound(_) => ErrorKind::NotFound,
            CallCenterError::Precondition(_) => ErrorKind::Precondition,
            CallCenterError::Validation(_) => ErrorKind::Validation,
            CallCenterError::Serialization(_) => ErrorKind::Data,
            CallCenterError::Store(_) | CallCenterError::Io(_) | CallCenterError::Api(_) => {
                ErrorKind::Store
            }
        }
    }

    /// Only store failures are worth another attempt; everything else is
    /// deterministic for the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CallCenterError::Store(_) | CallCenterError::Io(_))
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, CallCenterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_field() {
        let err = CallCenterError::Validation(vec![
            FieldError::new("Day", "Day must be between 1 and 31"),
            FieldError::new("Phone", "Only numbers are allowed"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: Day: Day must be between 1 and 31; Phone: Only numbers are allowed"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn only_store_errors_are_retryable() {
        assert!(CallCenterError::Store("offline".into()).is_retryable());
        assert!(!CallCenterError::NotFound("Ticket does not exist.".into()).is_retryable());
        assert!(!CallCenterError::Precondition("nope".into()).is_retryable());
    }

    #[test]
    fn decode_failures_are_data_errors() {
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CallCenterError::from(decode);
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(!err.is_retryable());
    }
}
