//! Storage error taxonomy
//!
//! Adapters translate every engine-native failure into one of these variants
//! before returning, so callers never inspect driver-specific errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("Operation canceled: {message}")]
    Canceled { message: String },

    #[error("Unsupported backend '{kind}'. Supported types: {supported}")]
    UnsupportedBackend { kind: String, supported: String },

    #[error("Storage error: {message}")]
    Backend { message: String },
}

impl StorageError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn canceled(message: impl Into<String>) -> Self {
        Self::Canceled {
            message: message.into(),
        }
    }

    pub fn unsupported_backend(kind: impl Into<String>, supported: impl Into<String>) -> Self {
        Self::UnsupportedBackend {
            kind: kind.into(),
            supported: supported.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
