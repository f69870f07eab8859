use picpocket_core::ConfigError;
use picpocket_db::DbError;
use picpocket_import::ImportError;
use thiserror::Error;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Configuration file could not be read or written
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// No configuration in the PicPocket directory
    #[error("No PicPocket configuration in {0}; run 'picpocket init' first")]
    NotInitialized(String),

    /// Argument that clap accepted but the command can't use
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CliError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
