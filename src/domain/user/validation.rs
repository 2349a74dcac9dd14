//! User input validation

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Caller-supplied user fields.
///
/// Ids and timestamps are owned by the storage layer and never read from input.
/// A draft must pass `validate()` before it is handed to a storage adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserDraft {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(email, length(max = 100))]
    pub email: String,
}

impl UserDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}
