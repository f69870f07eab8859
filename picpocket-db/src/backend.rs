//! Storage backends and the registry that maps configuration discriminants
//! to them.

use std::path::{Path, PathBuf};

use picpocket_core::{Configuration, Version, version};
use rusqlite::Connection;

use crate::dialect::{Dialect, SqliteDialect};
use crate::error::DbError;
use crate::schema::SQLITE_SCHEMA;
use crate::tables::{SQLITE_TABLES, Tables};

/// Default database file name, relative to the PicPocket directory.
pub const DEFAULT_SQLITE_FILE: &str = "picpocket.sqlite3";

/// One concrete storage engine.
pub trait Backend: Send + Sync {
    /// Discriminant used in the configuration file.
    fn name(&self) -> &'static str;

    fn dialect(&self) -> &dyn Dialect;

    fn tables(&self) -> &'static Tables;

    /// Script creating every table, run once by `initialize`.
    fn schema(&self) -> &'static str;

    /// Schema version this build reads and writes.
    fn schema_version(&self) -> Version;

    /// Validate and complete connection parameters from the configuration.
    /// Unknown keys and wrongly typed values are errors.
    fn parse_connection_info(&self, info: &toml::Table) -> Result<toml::Table, DbError>;

    /// Open a connection. With `should_exist`, fail unless the backing store
    /// does (`Some(true)`) or does not (`Some(false)`) exist yet.
    fn open(
        &self,
        configuration: &mut Configuration,
        should_exist: Option<bool>,
    ) -> Result<Connection, DbError>;

    /// Delete the backing store. Missing stores are not an error.
    fn remove(&self, configuration: &mut Configuration) -> Result<(), DbError>;
}

// ── SQLite ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SqliteBackend {
    dialect: SqliteDialect,
}

impl SqliteBackend {
    /// Database file for `configuration`. Relative paths are resolved
    /// against the configuration directory.
    pub fn database_path(&self, configuration: &mut Configuration) -> Result<PathBuf, DbError> {
        let info = self.parse_connection_info(&configuration.contents()?.backend.connection)?;
        let path = match info.get("path") {
            Some(toml::Value::String(path)) => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_SQLITE_FILE),
        };
        Ok(resolve(configuration.directory(), path))
    }
}

fn resolve(directory: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        directory.join(path)
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn tables(&self) -> &'static Tables {
        &SQLITE_TABLES
    }

    fn schema(&self) -> &'static str {
        SQLITE_SCHEMA
    }

    fn schema_version(&self) -> Version {
        version::sqlite_version()
    }

    fn parse_connection_info(&self, info: &toml::Table) -> Result<toml::Table, DbError> {
        let mut unknown: Vec<&str> = info
            .keys()
            .map(String::as_str)
            .filter(|key| *key != "path")
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(DbError::InvalidConnection(format!(
                "unknown configuration values: {}",
                unknown.join(", ")
            )));
        }

        let path = match info.get("path") {
            None => DEFAULT_SQLITE_FILE.to_string(),
            Some(toml::Value::String(path)) if !path.is_empty() => path.clone(),
            Some(other) => {
                return Err(DbError::InvalidConnection(format!(
                    "path must be a non-empty string, got {}",
                    other
                )));
            }
        };

        let mut parsed = toml::Table::new();
        parsed.insert("path".to_string(), toml::Value::String(path));
        Ok(parsed)
    }

    fn open(
        &self,
        configuration: &mut Configuration,
        should_exist: Option<bool>,
    ) -> Result<Connection, DbError> {
        let path = self.database_path(configuration)?;
        match should_exist {
            Some(true) if !path.is_file() => return Err(DbError::DoesNotExist(path)),
            Some(false) if path.exists() => return Err(DbError::AlreadyExists(path)),
            _ => {}
        }

        log::debug!("Opening SQLite database {}", path.display());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(conn)
    }

    fn remove(&self, configuration: &mut Configuration) -> Result<(), DbError> {
        let path = self.database_path(configuration)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Removed SQLite database {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ── Registry ────────────────────────────────────────────────────────────────

type BackendFactory = fn() -> Box<dyn Backend>;

/// Every backend this build can run, by discriminant.
static BACKENDS: &[(&str, BackendFactory)] = &[("sqlite", sqlite_backend)];

fn sqlite_backend() -> Box<dyn Backend> {
    Box::new(SqliteBackend::default())
}

/// Discriminants of all registered backends.
pub fn backend_names() -> Vec<&'static str> {
    BACKENDS.iter().map(|(name, _)| *name).collect()
}

/// Instantiate the backend registered under `name`.
pub fn backend(name: &str) -> Result<Box<dyn Backend>, DbError> {
    BACKENDS
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, factory)| factory())
        .ok_or_else(|| DbError::UnknownBackend(name.to_string()))
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
