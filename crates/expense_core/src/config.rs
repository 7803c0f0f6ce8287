//! Storage configuration.
//!
//! # Responsibility
//! - Name the available backends and parse them from user input.
//! - Load store settings from an optional JSON config file.
//!
//! # Invariants
//! - A missing config file yields `StoreConfig::default()`, never an error.
//! - File backends always resolve to a concrete path.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Interchangeable storage engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// One `Expense [...]` line per record.
    Text,
    /// Header plus comma-separated rows.
    Csv,
    /// One JSON array.
    Json,
    /// Embedded SQLite database.
    Sqlite,
    /// `_id`-keyed document collection.
    Document,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        BackendKind::Text,
        BackendKind::Csv,
        BackendKind::Json,
        BackendKind::Sqlite,
        BackendKind::Document,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Sqlite => "sqlite",
            Self::Document => "document",
        }
    }

    /// Default data file for backends that persist to one.
    pub fn default_file_name(self) -> Option<&'static str> {
        match self {
            Self::Text => Some("expenses.txt"),
            Self::Csv => Some("expenses.csv"),
            Self::Json => Some("expenses.json"),
            Self::Sqlite => Some("expenses.sqlite3"),
            Self::Document => None,
        }
    }

    fn is_file_backed(self) -> bool {
        matches!(self, Self::Text | Self::Csv | Self::Json)
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "sqlite" | "sql" => Ok(Self::Sqlite),
            "document" | "mongo" => Ok(Self::Document),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Where and how expenses are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Explicit data path. `None` means the backend default; for SQLite it
    /// means an in-memory database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(BackendKind::Json)
    }
}

impl StoreConfig {
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Loads a JSON config file such as
    /// `{ "backend": "csv", "path": "data/expenses.csv" }`.
    ///
    /// # Errors
    /// - `Io` when the file exists but cannot be read.
    /// - `Parse` when the file is not a valid config document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns the data path the backend will use, if any.
    ///
    /// File backends fall back to their default file name; SQLite without an
    /// explicit path and the document store are in-process.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match (&self.path, self.backend) {
            (_, BackendKind::Document) => None,
            (Some(path), _) => Some(path.clone()),
            (None, kind) if kind.is_file_backed() => kind.default_file_name().map(PathBuf::from),
            (None, _) => None,
        }
    }
}

/// Configuration loading failure.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    UnknownBackend(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::UnknownBackend(name) => write!(
                f,
                "unknown backend `{name}`; expected text|csv|json|sqlite|document"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::UnknownBackend(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}
