//! Domain layer - the user entity and the storage contract

pub mod storage;
pub mod user;

pub use storage::{BackendKind, CallContext, StorageError, UserStorage};
pub use user::{User, UserDraft, UserId};
