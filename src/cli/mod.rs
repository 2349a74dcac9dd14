//! CLI module for the user store service
//!
//! Subcommands:
//! - `serve`: run the HTTP API against the configured backend
//! - `check`: connect to the configured backend and report
//! - `backends`: list the supported backend kinds

pub mod backends;
pub mod check;
pub mod serve;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;

/// User REST API with swappable persistence backends
#[derive(Parser)]
#[command(name = "userstore-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve(serve::ServeArgs),

    /// Verify connectivity to the configured backend
    Check(check::CheckArgs),

    /// List supported backend kinds and their aliases
    Backends,
}

/// Loads `.env` and layered configuration, then applies command-line overrides
fn load_config(backend: Option<String>, port: Option<u16>) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    Ok(apply_overrides(config, backend, port))
}

fn apply_overrides(mut config: AppConfig, backend: Option<String>, port: Option<u16>) -> AppConfig {
    if let Some(backend) = backend {
        config.database.kind = backend;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let config = apply_overrides(AppConfig::default(), Some("postgres".to_string()), Some(9000));

        assert_eq!(config.database.kind, "postgres");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let config = apply_overrides(AppConfig::default(), None, None);

        assert_eq!(config.database.kind, "sqlite");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::try_parse_from(["userstore-api", "serve", "--backend", "mongodb", "--port", "3000"])
            .unwrap();

        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.backend.as_deref(), Some("mongodb"));
                assert_eq!(args.port, Some(3000));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_backends() {
        let cli = Cli::try_parse_from(["userstore-api", "backends"]).unwrap();
        assert!(matches!(cli.command, Command::Backends));
    }
}
