//! PostgreSQL storage adapter

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use super::rows::{assigned_id, id_param, not_found, UserRow};
use super::sql_error::map_sqlx_error;
use crate::domain::storage::{BackendKind, CallContext, StorageError, UserStorage};
use crate::domain::user::{timestamp_now, User, UserDraft, UserId};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(100) NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        deleted_at TIMESTAMPTZ
    )
"#;

const CREATE_DELETED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_users_deleted_at ON users (deleted_at)";

/// Connection parameters for a PostgreSQL-compatible server
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub connect_timeout: Duration,
}

/// PostgreSQL implementation of `UserStorage`
#[derive(Debug, Clone)]
pub struct PostgresUserStorage {
    pool: PgPool,
}

impl PostgresUserStorage {
    /// Prepares a lazily connecting pool; must be called inside a Tokio runtime
    pub fn new(config: &PostgresConfig) -> Self {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.database);

        if !config.password.is_empty() {
            options = options.password(&config.password);
        }

        let pool = PgPoolOptions::new()
            .acquire_timeout(config.connect_timeout)
            .connect_lazy_with(options);

        Self { pool }
    }
}

#[async_trait]
impl UserStorage for PostgresUserStorage {
    fn backend(&self) -> BackendKind {
        BackendKind::Postgres
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

        let raw_id: i64 = ctx
            .run(
                sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO users (name, email, created_at, updated_at)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(draft.name.as_str())
                .bind(draft.email.as_str())
                .bind(now)
                .bind(now)
                .fetch_one(&self.pool),
            )
            .await?
            .map_err(|e| map_sqlx_error("create user", e))?;

        Ok(User::create(assigned_id(raw_id)?, draft, now))
    }

    async fn get_user_by_id(&self, ctx: &CallContext, id: UserId) -> Result<User, StorageError> {
        let row = ctx
            .run(
                sqlx::query_as::<_, UserRow>(
                    "SELECT id, name, email, created_at, updated_at, deleted_at FROM users WHERE id = $1",
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
                sqlx::query("UPDATE users SET name = $2, email = $3, updated_at = $4 WHERE id = $1")
                    .bind(id_param(id)?)
                    .bind(updated.name())
                    .bind(updated.email())
                    .bind(updated.updated_at())
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
                sqlx::query("DELETE FROM users WHERE id = $1")
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
