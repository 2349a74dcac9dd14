//! Tracing subscriber setup

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};

/// Crates whose chatter is capped regardless of the configured level
const QUIET_TARGETS: &[(&str, &str)] = &[("tower_http", "info"), ("sqlx", "warn"), ("mongodb", "warn")];

fn default_directives(level: &str) -> String {
    QUIET_TARGETS
        .iter()
        .fold(level.to_string(), |directives, (target, cap)| {
            format!("{},{}={}", directives, target, cap)
        })
}

/// Installs the global subscriber; `RUST_LOG` takes precedence over the configured level.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_span_events(FmtSpan::CLOSE))
            .try_init()?,
    }

    tracing::info!(format = ?config.format, "Logging initialized with level: {}", config.level);
    Ok(())
}
