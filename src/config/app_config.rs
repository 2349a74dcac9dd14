use std::time::Duration;

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline applied to the storage calls of each request; 0 disables it
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Backend selection and connection parameters.
///
/// Only the fields relevant to the selected `type` are read. `fallback` is an
/// explicit opt-in consulted once at startup when the primary fails to connect.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub host: String,
    /// Falls back to the kind's default port when unset
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
    #[serde(alias = "dbName", alias = "dbname")]
    pub db_name: String,
    #[serde(alias = "filePath", alias = "filepath")]
    pub file_path: String,
    pub connect_timeout_secs: u64,
    pub fallback: Option<Box<DatabaseConfig>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: "sqlite".to_string(),
            host: "localhost".to_string(),
            port: None,
            user: String::new(),
            password: String::new(),
            db_name: "user_api".to_string(),
            file_path: "user_api.db".to_string(),
            connect_timeout_secs: 5,
            fallback: None,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("db_name", &self.db_name)
            .field("file_path", &self.file_path)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl DatabaseConfig {
    /// In-memory SQLite configuration
    pub fn in_memory() -> Self {
        Self {
            file_path: crate::infrastructure::storage::MEMORY_PATH.to_string(),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_fallback(mut self, fallback: DatabaseConfig) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.database.kind, "sqlite");
        assert_eq!(config.database.file_path, "user_api.db");
        assert!(config.database.fallback.is_none());
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let server = ServerConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };

        assert_eq!(server.request_timeout(), None);
    }

    #[test]
    fn test_deserialize_with_aliases_and_fallback() {
        let raw = serde_json::json!({
            "database": {
                "type": "postgres",
                "host": "db.internal",
                "port": 5433,
                "dbName": "users",
                "fallback": { "type": "sqlite", "filePath": "/tmp/users.db" }
            }
        });

        let config: AppConfig = serde_json::from_value(raw).unwrap();
        assert_eq!(config.database.kind, "postgres");
        assert_eq!(config.database.port, Some(5433));
        assert_eq!(config.database.db_name, "users");

        let fallback = config.database.fallback.unwrap();
        assert_eq!(fallback.kind, "sqlite");
        assert_eq!(fallback.file_path, "/tmp/users.db");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_debug_hides_password() {
        let config = DatabaseConfig {
            password: "hunter2".to_string(),
            ..Default::default()
        };

        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
