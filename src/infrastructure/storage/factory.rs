//! Storage factory for configuration-driven backend selection

use std::sync::Arc;

use tracing::{info, warn};

use super::mongodb::{MongoConfig, MongoUserStorage};
use super::mysql::{MySqlConfig, MySqlUserStorage};
use super::postgres::{PostgresConfig, PostgresUserStorage};
use super::sqlite::SqliteUserStorage;
use crate::config::DatabaseConfig;
use crate::domain::storage::{BackendKind, StorageError, UserStorage};

/// Builds the `UserStorage` adapter named by a `DatabaseConfig`
pub struct StorageFactory;

impl StorageFactory {
    /// Constructs the adapter without connecting.
    ///
    /// Unknown kinds fail with `UnsupportedBackend`.
    pub fn create(config: &DatabaseConfig) -> Result<Arc<dyn UserStorage>, StorageError> {
        let kind = config.kind.parse::<BackendKind>()?;
        let connect_timeout = config.connect_timeout();
        let port = config.port.or(kind.default_port()).unwrap_or_default();

        let storage: Arc<dyn UserStorage> = match kind {
            BackendKind::RelationalFile | BackendKind::RelationalFilePure => Arc::new(
                SqliteUserStorage::open(kind, &config.file_path, connect_timeout)?,
            ),
            BackendKind::MySql => Arc::new(MySqlUserStorage::new(&MySqlConfig {
                host: config.host.clone(),
                port,
                user: config.user.clone(),
                password: config.password.clone(),
                database: config.db_name.clone(),
                connect_timeout,
            })),
            BackendKind::Postgres => Arc::new(PostgresUserStorage::new(&PostgresConfig {
                host: config.host.clone(),
                port,
                user: config.user.clone(),
                password: config.password.clone(),
                database: config.db_name.clone(),
                connect_timeout,
            })),
            BackendKind::DocumentStore => Arc::new(MongoUserStorage::new(MongoConfig {
                host: config.host.clone(),
                port,
                user: config.user.clone(),
                password: config.password.clone(),
                database: config.db_name.clone(),
                connect_timeout,
            })),
        };

        Ok(storage)
    }

    /// Constructs and connects the configured adapter.
    ///
    /// A connect failure is fatal unless `fallback` is configured, in which case the
    /// fallback kind is tried exactly once. Selection never changes after this returns.
    pub async fn initialize(config: &DatabaseConfig) -> Result<Arc<dyn UserStorage>, StorageError> {
        let primary = Self::create(config)?;

        let error = match primary.connect().await {
            Ok(()) => {
                info!(backend = %primary.backend(), "Storage backend connected");
                return Ok(primary);
            }
            Err(error) => error,
        };

        let Some(fallback) = config.fallback.as_deref() else {
            return Err(error);
        };

        warn!(
            backend = %primary.backend(),
            fallback = %fallback.kind,
            error = %error,
            "Storage backend failed to connect, trying configured fallback"
        );

        let secondary = Self::create(fallback)?;
        secondary.connect().await?;
        info!(backend = %secondary.backend(), "Fallback storage backend connected");

        Ok(secondary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::CallContext;
    use crate::domain::user::UserDraft;

    fn unreachable_sqlite() -> DatabaseConfig {
        DatabaseConfig {
            file_path: "/nonexistent-userstore-dir/nested/users.db".to_string(),
            connect_timeout_secs: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_initialize_in_memory() {
        let storage = StorageFactory::initialize(&DatabaseConfig::in_memory())
            .await
            .unwrap();

        assert_eq!(storage.backend(), BackendKind::RelationalFile);
        let users = storage.get_all_users(&CallContext::background()).await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_aliases_select_kinds() {
        let pure = StorageFactory::create(&DatabaseConfig::in_memory().with_kind("sqlite-pure"))
            .unwrap();
        assert_eq!(pure.backend(), BackendKind::RelationalFilePure);

        let postgres = StorageFactory::create(&DatabaseConfig::default().with_kind("postgresql"))
            .unwrap();
        assert_eq!(postgres.backend(), BackendKind::Postgres);

        let mysql = StorageFactory::create(&DatabaseConfig::default().with_kind("mysql")).unwrap();
        assert_eq!(mysql.backend(), BackendKind::MySql);

        let mongo = StorageFactory::create(&DatabaseConfig::default().with_kind("document-store"))
            .unwrap();
        assert_eq!(mongo.backend(), BackendKind::DocumentStore);
    }

    #[tokio::test]
    async fn test_unsupported_kind() {
        let config = DatabaseConfig::default().with_kind("oracle");

        let result = StorageFactory::initialize(&config).await;
        match result {
            Err(StorageError::UnsupportedBackend { kind, supported }) => {
                assert_eq!(kind, "oracle");
                assert!(supported.contains("document-store"));
            }
            other => panic!("expected UnsupportedBackend, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unsupported_kind_is_fatal_even_with_fallback() {
        let config = DatabaseConfig::default()
            .with_kind("oracle")
            .with_fallback(DatabaseConfig::in_memory());

        let result = StorageFactory::initialize(&config).await;
        assert!(matches!(result, Err(StorageError::UnsupportedBackend { .. })));
    }

    #[tokio::test]
    async fn test_connect_failure_without_fallback_is_fatal() {
        let result = StorageFactory::initialize(&unreachable_sqlite()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_opt_in_fallback_used_once() {
        let config = unreachable_sqlite()
            .with_fallback(DatabaseConfig::in_memory().with_kind("sqlite-pure"));

        let storage = StorageFactory::initialize(&config).await.unwrap();
        assert_eq!(storage.backend(), BackendKind::RelationalFilePure);

        let ctx = CallContext::background();
        let user = storage
            .create_user(&ctx, UserDraft::new("Alice", "alice@example.com"))
            .await
            .unwrap();
        assert_eq!(storage.get_user_by_id(&ctx, user.id()).await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_failing_fallback_is_fatal() {
        let config = unreachable_sqlite().with_fallback(unreachable_sqlite());

        assert!(StorageFactory::initialize(&config).await.is_err());
    }
}
