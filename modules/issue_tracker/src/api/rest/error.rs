//! Mapping of domain outcomes onto the wire bodies.
//!
//! The same error kind reads differently per mutation (`could not update` vs
//! `could not delete`), so that mapping is keyed by the operation. The `_id`
//! echoed back is the value the client sent, not its string form.

use serde_json::Value;

use crate::api::rest::dto::{ErrorBody, ResultBody};
use crate::domain::error::DomainError;

/// Mutations addressed by `_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Update,
    Delete,
}

impl Operation {
    fn not_found_message(self) -> &'static str {
        match self {
            Self::Update => "could not update",
            Self::Delete => "could not delete",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Self::Update => "successfully updated",
            Self::Delete => "successfully deleted",
        }
    }
}

/// Create fails only on missing required fields and never carries an id.
pub fn create_error_body(error: DomainError) -> ErrorBody {
    ErrorBody {
        error: error.to_string(),
        id: None,
    }
}

pub fn error_body(op: Operation, error: DomainError, echo: Option<Value>) -> ErrorBody {
    let (message, id) = match error {
        DomainError::RequiredFieldsMissing => ("required field(s) missing", None),
        DomainError::MissingId => ("missing _id", None),
        DomainError::NoUpdateFields { id } => ("no update field(s) sent", Some(id)),
        DomainError::IssueNotFound { id } => (op.not_found_message(), Some(id)),
    };
    ErrorBody {
        error: message.to_owned(),
        id: id.map(|id| echo.unwrap_or(Value::String(id))),
    }
}

pub fn result_body(op: Operation, id: String, echo: Option<Value>) -> ResultBody {
    ResultBody {
        result: op.success_message().to_owned(),
        id: echo.unwrap_or(Value::String(id)),
    }
}
