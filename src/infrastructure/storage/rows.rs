//! Row mapping shared by the relational adapters

use chrono::{DateTime, Utc};

use crate::domain::storage::StorageError;
use crate::domain::user::{User, UserId};

/// `users` table row, decoded identically by every sqlx driver
#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    id: i64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = u64::try_from(row.id)
            .map_err(|_| StorageError::backend(format!("Invalid user id in database: {}", row.id)))?;

        Ok(User::restore(
            UserId::new(id),
            row.name,
            row.email,
            row.created_at,
            row.updated_at,
            row.deleted_at,
        ))
    }
}

/// Converts an id to the signed key column type.
///
/// Ids beyond `i64::MAX` can never have been assigned, so they are reported as
/// missing rather than as engine errors.
pub(super) fn id_param(id: UserId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| not_found(id))
}

/// Converts an engine-assigned key back into a `UserId`
pub(super) fn assigned_id(raw: i64) -> Result<UserId, StorageError> {
    u64::try_from(raw)
        .map(UserId::new)
        .map_err(|_| StorageError::backend(format!("Engine assigned an invalid id: {}", raw)))
}

pub(super) fn not_found(id: UserId) -> StorageError {
    StorageError::not_found(format!("User {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::timestamp_now;

    #[test]
    fn test_row_to_user() {
        let now = timestamp_now();
        let row = UserRow {
            id: 5,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let user = User::try_from(row).unwrap();
        assert_eq!(user.id(), UserId::new(5));
        assert_eq!(user.email(), "alice@example.com");
        assert_eq!(user.created_at(), now);
    }

    #[test]
    fn test_negative_row_id_rejected() {
        let now = timestamp_now();
        let row = UserRow {
            id: -1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        assert!(matches!(User::try_from(row), Err(StorageError::Backend { .. })));
    }

    #[test]
    fn test_id_param_out_of_range_is_not_found() {
        assert_eq!(id_param(UserId::new(12)), Ok(12));
        assert!(id_param(UserId::new(u64::MAX)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_assigned_id() {
        assert_eq!(assigned_id(3), Ok(UserId::new(3)));
        assert!(assigned_id(-3).is_err());
    }
}
