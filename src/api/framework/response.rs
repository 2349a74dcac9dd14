//! Response builder and the JSON envelopes it writes

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Success envelope: `{"message": ..., "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    pub message: String,
    pub data: T,
}

/// Error envelope: `{"error": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// Chainable response builder.
///
/// `status` records the code for the eventual write; `success` and `error` are
/// terminal and consume the builder, yielding the [`Reply`] to send.
#[derive(Debug, Clone, Copy)]
#[must_use = "a Response does nothing until a terminal write produces a Reply"]
pub struct Response {
    status: StatusCode,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Writes the success envelope at the current status
    pub fn success<T: Serialize>(self, message: impl Into<String>, data: T) -> Reply {
        let envelope = SuccessEnvelope {
            message: message.into(),
            data,
        };

        match serde_json::to_value(&envelope) {
            Ok(body) => Reply {
                status: self.status,
                body,
            },
            Err(e) => {
                error!(error = %e, "Failed to serialize response payload");
                self.error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }

    /// Writes the error envelope with `status`
    pub fn error(self, status: StatusCode, message: impl Into<String>) -> Reply {
        let envelope = ErrorEnvelope {
            error: message.into(),
        };

        let body = serde_json::to_value(&envelope)
            .unwrap_or_else(|_| serde_json::json!({ "error": "Internal server error" }));

        Reply { status, body }
    }
}

/// A finished response: status plus JSON envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    status: StatusCode,
    body: serde_json::Value,
}

impl Reply {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}
