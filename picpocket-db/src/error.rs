use std::path::PathBuf;

use picpocket_core::{ConfigError, FormatError, PatternError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No backend is registered under this discriminant
    #[error("Unknown backend type: {0}")]
    UnknownBackend(String),

    /// The configuration names a different backend than the one loaded
    #[error("Configuration is for a {found} backend, not {expected}")]
    WrongBackend { expected: &'static str, found: String },

    /// Connection parameters the backend does not understand
    #[error("Invalid connection info: {0}")]
    InvalidConnection(String),

    #[error("Database does not exist: {}", .0.display())]
    DoesNotExist(PathBuf),

    #[error("Database already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Not connected to the database")]
    NotConnected,

    #[error("Database does not contain version information")]
    UnknownVersion,

    #[error("Unsafe SQL identifier: {0:?}")]
    UnsafeIdentifier(String),

    #[error("Unsafe SQL placeholder: {0:?}")]
    UnsafePlaceholder(String),

    #[error("Unknown column '{column}' for table '{table}'")]
    UnknownColumn { table: &'static str, column: String },

    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound { entity_type: &'static str, id: String },

    #[error("{entity_type} '{id}' already exists")]
    Duplicate { entity_type: &'static str, id: String },

    /// Arguments rejected before touching the database
    #[error("{0}")]
    InvalidInput(String),

    /// Operation would leave dangling references behind
    #[error("{0}")]
    DataIntegrity(String),
}

impl DbError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }
}
