use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("required field(s) missing")]
    RequiredFieldsMissing,

    #[error("missing _id")]
    MissingId,

    #[error("no update field(s) sent for issue {id}")]
    NoUpdateFields { id: String },

    #[error("Issue not found: {id}")]
    IssueNotFound { id: String },
}

impl DomainError {
    pub fn required_fields_missing() -> Self {
        Self::RequiredFieldsMissing
    }

    pub fn missing_id() -> Self {
        Self::MissingId
    }

    pub fn no_update_fields(id: impl Into<String>) -> Self {
        Self::NoUpdateFields { id: id.into() }
    }

    pub fn issue_not_found(id: impl Into<String>) -> Self {
        Self::IssueNotFound { id: id.into() }
    }
}
