//! Handler error type and its mapping onto the error envelope

use axum::http::StatusCode;
use validator::ValidationErrors;

use super::framework::{Reply, Response};
use crate::domain::storage::StorageError;

/// Error categories surfaced by terminal handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    ValidationFailed,
    MalformedRequest,
    NotFound,
    Storage,
    Internal,
}

impl ApiErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ValidationFailed | Self::MalformedRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Storage | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned by a terminal handler.
///
/// `message` is what the client sees. `cause` holds the underlying detail for
/// server-side logs and is never written to the response.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    cause: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl ToString) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn validation(detail: impl std::fmt::Display) -> Self {
        Self::new(
            ApiErrorKind::ValidationFailed,
            format!("Validation failed: {}", detail),
        )
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::MalformedRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Internal, message)
    }

    /// Maps a storage failure: missing records become 404, everything else a
    /// generic 500 carrying `message` with the storage error kept as the cause
    pub fn from_storage(err: StorageError, message: impl Into<String>) -> Self {
        if err.is_not_found() {
            return Self::not_found("User not found").with_cause(err);
        }

        Self::new(ApiErrorKind::Storage, message).with_cause(err)
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    pub fn into_reply(self) -> Reply {
        Response::new().error(self.status(), self.message)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, field_errors)| {
                let codes = field_errors
                    .iter()
                    .map(|e| describe_code(&e.code))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: {}", field, codes)
            })
            .collect();
        fields.sort();

        Self::validation(fields.join("; "))
    }
}

fn describe_code(code: &str) -> &str {
    match code {
        "length" => "invalid length",
        "email" => "invalid email address",
        "required" => "required",
        other => other,
    }
}

impl From<ApiError> for Reply {
    fn from(err: ApiError) -> Self {
        err.into_reply()
    }
}
