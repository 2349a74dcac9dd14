//! Serve command - runs the HTTP API

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::api::create_router;
use crate::config::AppConfig;
use crate::domain::storage::UserStorage;
use crate::infrastructure::logging;
use crate::infrastructure::storage::StorageFactory;

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Backend kind, overriding `database.type`
    #[arg(long, short)]
    pub backend: Option<String>,

    /// Listen port, overriding `server.port`
    #[arg(long, short)]
    pub port: Option<u16>,
}

/// Run the API server until Ctrl+C or SIGTERM, then close storage
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.backend, args.port)?;
    logging::init_logging(&config.logging)?;

    let storage = StorageFactory::initialize(&config.database)
        .await
        .context("Failed to initialize storage")?;

    serve_then_close(&config, storage, shutdown_signal()).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Serves until `shutdown` resolves; storage is closed whether or not serving succeeded
async fn serve_then_close<F>(
    config: &AppConfig,
    storage: Arc<dyn UserStorage>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let served = serve(config, Arc::clone(&storage), shutdown).await;

    if let Err(e) = storage.close().await {
        warn!(error = %e, "Failed to close storage cleanly");
    }
    served
}

async fn serve<F>(config: &AppConfig, storage: Arc<dyn UserStorage>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = build_socket_addr(config)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(backend = %storage.backend(), "Starting server on {}", addr);

    let app = create_router(storage, config.server.request_timeout());
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::mock::MockUserStorage;

    #[test]
    fn test_build_socket_addr() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;

        assert_eq!(build_socket_addr(&config).unwrap().to_string(), "127.0.0.1:9090");
    }

    #[test]
    fn test_invalid_host_rejected() {
        let mut config = AppConfig::default();
        config.server.host = "not a host".to_string();

        assert!(build_socket_addr(&config).is_err());
    }

    #[tokio::test]
    async fn test_storage_closed_when_bind_fails() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = occupied.local_addr().unwrap().port();
        let storage = Arc::new(MockUserStorage::new());

        let result = serve_then_close(&config, storage.clone(), std::future::pending()).await;

        assert!(result.unwrap_err().to_string().starts_with("Failed to bind"));
        assert_eq!(storage.call_count("close"), 1);
    }

    #[tokio::test]
    async fn test_storage_closed_after_graceful_shutdown() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        let storage = Arc::new(MockUserStorage::new());

        serve_then_close(&config, storage.clone(), async {}).await.unwrap();

        assert_eq!(storage.call_count("close"), 1);
    }
}
