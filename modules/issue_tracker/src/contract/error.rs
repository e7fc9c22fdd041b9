use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueTrackerError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Issue id is required")]
    MissingId,

    #[error("No update fields sent for issue {id}")]
    NoUpdateFields { id: String },

    #[error("Issue not found: {id}")]
    NotFound { id: String },
}

impl IssueTrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}

impl From<crate::domain::error::DomainError> for IssueTrackerError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            e @ RequiredFieldsMissing => Self::validation(e.to_string()),
            MissingId => Self::MissingId,
            NoUpdateFields { id } => Self::NoUpdateFields { id },
            IssueNotFound { id } => Self::not_found(id),
        }
    }
}
