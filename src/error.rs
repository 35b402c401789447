use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Data file error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),
    #[error("Database API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Database returned no row for {0}")]
    MissingRow(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    InvalidState,
    Unauthenticated,
    Persistence,
}

#[derive(Debug, thiserror::Error)]
pub enum TimesheetError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl TimesheetError {
    pub fn validation(message: impl Into<String>) -> Self {
        TimesheetError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        TimesheetError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        TimesheetError::Forbidden(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        TimesheetError::InvalidState(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TimesheetError::Validation(_) => ErrorKind::Validation,
            TimesheetError::NotFound(_) => ErrorKind::NotFound,
            TimesheetError::Forbidden(_) => ErrorKind::Forbidden,
            TimesheetError::InvalidState(_) => ErrorKind::InvalidState,
            TimesheetError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            TimesheetError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            TimesheetError::Persistence(_) => "Operation failed".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T, E = TimesheetError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_message_is_generic() {
        let err = TimesheetError::from(StoreError::MissingRow("timesheet_users".to_string()));
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(err.user_message(), "Operation failed");
        assert!(err.to_string().contains("timesheet_users"));
    }

    #[test]
    fn business_errors_keep_their_message() {
        let err = TimesheetError::invalid_state("Entry is already submitted. Cannot submit.");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.user_message(), "Entry is already submitted. Cannot submit.");
    }
}
