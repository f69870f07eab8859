use std::path::PathBuf;

use picpocket_core::{FormatError, PatternError};
use picpocket_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// The file does not live under the location being imported into
    #[error("{} is not inside {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// Removable location with no path and no mount
    #[error("Location '{0}' has no path; mount it first")]
    NoRoot(String),

    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),
}

impl ImportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
