//! Closed set of supported storage backends

use std::str::FromStr;

use serde::Serialize;

use super::StorageError;

/// Backend kinds selectable through configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Embedded SQLite file using a write-ahead log
    RelationalFile,
    /// Embedded SQLite file using the classic rollback journal
    RelationalFilePure,
    /// MySQL-compatible server
    #[serde(rename = "relational-networked-mysql-like")]
    MySql,
    /// PostgreSQL-compatible server
    #[serde(rename = "relational-networked-postgres-like")]
    Postgres,
    /// MongoDB document store
    DocumentStore,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        Self::RelationalFile,
        Self::RelationalFilePure,
        Self::MySql,
        Self::Postgres,
        Self::DocumentStore,
    ];

    /// Short names accepted in addition to the canonical one
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::RelationalFile => &["sqlite"],
            Self::RelationalFilePure => &["sqlite-pure"],
            Self::MySql => &["mysql"],
            Self::Postgres => &["postgres", "postgresql"],
            Self::DocumentStore => &["mongodb", "mongo"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RelationalFile => "relational-file",
            Self::RelationalFilePure => "relational-file-pure",
            Self::MySql => "relational-networked-mysql-like",
            Self::Postgres => "relational-networked-postgres-like",
            Self::DocumentStore => "document-store",
        }
    }

    /// Comma-separated list of canonical kind names
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Default server port for networked kinds
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySql => Some(3306),
            Self::Postgres => Some(5432),
            Self::DocumentStore => Some(27017),
            Self::RelationalFile | Self::RelationalFilePure => None,
        }
    }
}

/// Parses a configured kind, accepting the historical short aliases
impl FromStr for BackendKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();

        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name || kind.aliases().contains(&name.as_str()))
            .ok_or_else(|| StorageError::unsupported_backend(s, Self::supported()))
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
