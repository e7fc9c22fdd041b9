use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors produced by the ingress itself (unknown routes, middleware failures).
/// Module handlers report their own outcomes and never go through this type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("request timed out")]
    Timeout,
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Timeout => (StatusCode::REQUEST_TIMEOUT, "timeout"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();

        match &self {
            Self::Internal(err) => tracing::error!(
                error = %err,
                status = status.as_u16(),
                "request failed"
            ),
            other => tracing::debug!(
                error = %other,
                status = status.as_u16(),
                "request failed"
            ),
        }

        let message = self.to_string();
        let body = ErrorBody {
            code,
            message: &message,
        };
        (status, Json(body)).into_response()
    }
}
