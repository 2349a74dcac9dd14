//! SQLite storage adapter for the file-backed relational kinds

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use super::rows::{assigned_id, id_param, not_found, UserRow};
use super::sql_error::map_sqlx_error;
use crate::domain::storage::{BackendKind, CallContext, StorageError, UserStorage};
use crate::domain::user::{timestamp_now, User, UserDraft, UserId};

/// File path that selects a private in-memory database
pub const MEMORY_PATH: &str = ":memory:";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(100) NOT NULL UNIQUE,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        deleted_at DATETIME
    )
"#;

const CREATE_DELETED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_users_deleted_at ON users (deleted_at)";

/// SQLite implementation of `UserStorage`.
///
/// `AUTOINCREMENT` keeps ids from being reused after deletes. The pool is built
/// lazily and opens the file on `connect()`.
#[derive(Debug, Clone)]
pub struct SqliteUserStorage {
    kind: BackendKind,
    path: String,
    pool: SqlitePool,
}

impl SqliteUserStorage {
    /// Prepares an adapter for `path`; must be called inside a Tokio runtime
    pub fn open(
        kind: BackendKind,
        path: &str,
        connect_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let pool = if path == MEMORY_PATH {
            let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
                StorageError::backend(format!("Invalid SQLite options: {}", e))
            })?;

            // Every connection would get its own empty database, so keep exactly one alive
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .acquire_timeout(connect_timeout)
                .connect_lazy_with(options)
        } else {
            let journal_mode = match kind {
                BackendKind::RelationalFilePure => SqliteJournalMode::Delete,
                _ => SqliteJournalMode::Wal,
            };
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(journal_mode);

            SqlitePoolOptions::new()
                .acquire_timeout(connect_timeout)
                .connect_lazy_with(options)
        };

        Ok(Self {
            kind,
            path: path.to_string(),
            pool,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl UserStorage for SqliteUserStorage {
    fn backend(&self) -> BackendKind {
        self.kind
    }

    async fn connect(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create users table", e))?;

        sqlx::query(CREATE_DELETED_AT_INDEX)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create users index", e))?;

        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }

    async fn create_user(
        &self,
        ctx: &CallContext,
        draft: UserDraft,
    ) -> Result<User, StorageError> {
        let now = timestamp_now();

        let result = ctx
            .run(
                sqlx::query(
                    "INSERT INTO users (name, email, created_at, updated_at) VALUES (?, ?, ?, ?)",
                )
                .bind(draft.name.as_str())
                .bind(draft.email.as_str())
                .bind(now)
                .bind(now)
                .execute(&self.pool),
            )
            .await?
            .map_err(|e| map_sqlx_error("create user", e))?;

        let id = assigned_id(result.last_insert_rowid())?;
        Ok(User::create(id, draft, now))
    }

    async fn get_user_by_id(&self, ctx: &CallContext, id: UserId) -> Result<User, StorageError> {
        let row = ctx
            .run(
                sqlx::query_as::<_, UserRow>(
                    "SELECT id, name, email, created_at, updated_at, deleted_at FROM users WHERE id = ?",
                )
                .bind(id_param(id)?)
                .fetch_optional(&self.pool),
            )
            .await?
            .map_err(|e| map_sqlx_error("get user", e))?;

        row.ok_or_else(|| not_found(id))?.try_into()
    }

    async fn get_all_users(&self, ctx: &CallContext) -> Result<Vec<User>, StorageError> {
        let rows = ctx
            .run(
                sqlx::query_as::<_, UserRow>(
                    "SELECT id, name, email, created_at, updated_at, deleted_at FROM users ORDER BY id",
                )
                .fetch_all(&self.pool),
            )
            .await?
            .map_err(|e| map_sqlx_error("list users", e))?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn update_user(
        &self,
        ctx: &CallContext,
        id: UserId,
        draft: UserDraft,
    ) -> Result<User, StorageError> {
        let updated = self.get_user_by_id(ctx, id).await?.revise(draft);

        let result = ctx
            .run(
                sqlx::query("UPDATE users SET name = ?, email = ?, updated_at = ? WHERE id = ?")
                    .bind(updated.name())
                    .bind(updated.email())
                    .bind(updated.updated_at())
                    .bind(id_param(id)?)
                    .execute(&self.pool),
            )
            .await?
            .map_err(|e| map_sqlx_error("update user", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        Ok(updated)
    }

    async fn delete_user(&self, ctx: &CallContext, id: UserId) -> Result<(), StorageError> {
        let result = ctx
            .run(
                sqlx::query("DELETE FROM users WHERE id = ?")
                    .bind(id_param(id)?)
                    .execute(&self.pool),
            )
            .await?
            .map_err(|e| map_sqlx_error("delete user", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }
}
