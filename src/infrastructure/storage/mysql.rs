//! MySQL storage adapter

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use super::rows::{assigned_id, id_param, not_found, UserRow};
use super::sql_error::map_sqlx_error;
use crate::domain::storage::{BackendKind, CallContext, StorageError, UserStorage};
use crate::domain::user::{timestamp_now, User, UserDraft, UserId};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(100) NOT NULL,
        created_at DATETIME(6) NOT NULL,
        updated_at DATETIME(6) NOT NULL,
        deleted_at DATETIME(6) NULL,
        UNIQUE KEY uq_users_email (email),
        KEY idx_users_deleted_at (deleted_at)
    ) CHARACTER SET utf8mb4
"#;

/// Connection parameters for a MySQL-compatible server
#[derive(Debug, Clone)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub connect_timeout: Duration,
}

/// MySQL implementation of `UserStorage`
#[derive(Debug, Clone)]
pub struct MySqlUserStorage {
    pool: MySqlPool,
}

impl MySqlUserStorage {
    /// Prepares a lazily connecting pool; must be called inside a Tokio runtime
    pub fn new(config: &MySqlConfig) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.database)
            .charset("utf8mb4");

        if !config.password.is_empty() {
            options = options.password(&config.password);
        }

        let pool = MySqlPoolOptions::new()
            .acquire_timeout(config.connect_timeout)
            .connect_lazy_with(options);

        Self { pool }
    }
}

#[async_trait]
impl UserStorage for MySqlUserStorage {
    fn backend(&self) -> BackendKind {
        BackendKind::MySql
    }

    async fn connect(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create users table", e))?;

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

        let raw_id = i64::try_from(result.last_insert_id()).map_err(|_| {
            StorageError::backend(format!("Engine assigned an invalid id: {}", result.last_insert_id()))
        })?;

        Ok(User::create(assigned_id(raw_id)?, draft, now))
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

        // MySQL counts matched-but-unchanged rows as unaffected; updated_at always changes
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
