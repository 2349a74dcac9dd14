//! User storage contract

use std::fmt::Debug;

use async_trait::async_trait;

use super::context::CallContext;
use super::error::StorageError;
use super::kind::BackendKind;
use crate::domain::user::{User, UserDraft, UserId};

/// CRUD contract implemented identically by every backend adapter.
///
/// Implementations are shared across request tasks and must be safe to call
/// concurrently. Drafts reaching an adapter have already been validated.
#[async_trait]
pub trait UserStorage: Send + Sync + Debug {
    /// The backend kind this adapter serves
    fn backend(&self) -> BackendKind;

    /// Establishes the connection and creates the schema if absent
    async fn connect(&self) -> Result<(), StorageError>;

    /// Releases the underlying connection resources
    async fn close(&self) -> Result<(), StorageError>;

    /// Persists a new user, assigning its id and timestamps.
    /// Fails with `ConstraintViolation` when the email is taken.
    async fn create_user(&self, ctx: &CallContext, draft: UserDraft)
        -> Result<User, StorageError>;

    async fn get_user_by_id(&self, ctx: &CallContext, id: UserId) -> Result<User, StorageError>;

    /// Returns every user; an empty store yields an empty list
    async fn get_all_users(&self, ctx: &CallContext) -> Result<Vec<User>, StorageError>;

    /// Replaces name and email of an existing user, refreshing `updated_at`
    async fn update_user(
        &self,
        ctx: &CallContext,
        id: UserId,
        draft: UserDraft,
    ) -> Result<User, StorageError>;

    /// Removes a user; a missing id reports `NotFound` every time
    async fn delete_user(&self, ctx: &CallContext, id: UserId) -> Result<(), StorageError>;
}
