//! Storage domain - the user storage contract shared by every backend

mod context;
mod error;
mod kind;
mod repository;

pub use context::CallContext;
pub use error::StorageError;
pub use kind::BackendKind;
pub use repository::UserStorage;

#[cfg(test)]
pub use repository::mock;
