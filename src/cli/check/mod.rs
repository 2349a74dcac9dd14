//! Check command - verifies the configured backend is reachable

use std::time::Duration;

use anyhow::Context;
use clap::Args;
use tracing::warn;

use crate::domain::storage::{CallContext, UserStorage};
use crate::infrastructure::logging;
use crate::infrastructure::storage::StorageFactory;

#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Backend kind, overriding `database.type`
    #[arg(long, short)]
    pub backend: Option<String>,
}

pub async fn run(args: CheckArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.backend, None)?;
    logging::init_logging(&config.logging)?;

    let storage = StorageFactory::initialize(&config.database)
        .await
        .context("Backend check failed")?;

    let count = probe_then_close(storage.as_ref(), config.database.connect_timeout()).await?;
    println!("Backend {} is reachable ({} users)", storage.backend(), count);
    Ok(())
}

/// Probes then closes storage; a close failure is logged and the probe result returned
async fn probe_then_close(storage: &dyn UserStorage, timeout: Duration) -> anyhow::Result<usize> {
    let result = probe(storage, timeout).await;

    if let Err(e) = storage.close().await {
        warn!(error = %e, "Failed to close storage cleanly");
    }
    result
}

/// Runs a full listing within `timeout` and returns the number of users
async fn probe(storage: &dyn UserStorage, timeout: Duration) -> anyhow::Result<usize> {
    let users = storage
        .get_all_users(&CallContext::with_timeout(timeout))
        .await
        .context("Failed to list users")?;

    Ok(users.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::storage::mock::MockUserStorage;
    use crate::domain::storage::StorageError;
    use crate::domain::user::UserDraft;

    #[tokio::test]
    async fn test_probe_counts_users() {
        let storage = MockUserStorage::new();
        storage
            .create_user(&CallContext::background(), UserDraft::new("Alice", "alice@example.com"))
            .await
            .unwrap();

        assert_eq!(probe(&storage, Duration::from_secs(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_probe_reports_storage_errors() {
        let storage = MockUserStorage::new().with_error(StorageError::unavailable("down"));

        assert!(probe(&storage, Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_close_failure_keeps_probe_error() {
        let storage = MockUserStorage::new().with_error(StorageError::unavailable("down"));

        let error = probe_then_close(&storage, Duration::from_secs(1)).await.unwrap_err();

        assert_eq!(error.to_string(), "Failed to list users");
        assert_eq!(storage.call_count("close"), 1);
    }
}
