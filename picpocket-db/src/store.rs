//! The storage engine: one configured backend, its single connection and the
//! transactional cursor every operation runs through.

use std::collections::HashMap;
use std::path::PathBuf;

use picpocket_core::Configuration;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, Transaction};

use crate::backend::{self, Backend};
use crate::dialect::Dialect;
use crate::error::DbError;
use crate::tables::{Bindings, Tables};

/// A PicPocket catalog backed by one storage engine.
pub struct Store {
    backend: Box<dyn Backend>,
    configuration: Configuration,
    connection: Option<Connection>,
    pub(crate) mounts: HashMap<i64, PathBuf>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.name())
            .field("configuration", &self.configuration)
            .field("connected", &self.connection.is_some())
            .field("mounts", &self.mounts)
            .finish()
    }
}

impl Store {
    /// Pick the backend named by the configuration's `backend.type`.
    pub fn load(mut configuration: Configuration) -> Result<Self, DbError> {
        let backend_type = configuration.backend_type()?;
        let backend = backend::backend(&backend_type)?;
        Ok(Self::with_backend(backend, configuration))
    }

    pub fn with_backend(backend: Box<dyn Backend>, configuration: Configuration) -> Self {
        Self {
            backend,
            configuration,
            connection: None,
            mounts: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn configuration(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Open the connection, replacing any existing one.
    ///
    /// Fails if the configuration names another backend, or if
    /// `should_exist` disagrees with the state of the backing store.
    pub fn connect(&mut self, should_exist: Option<bool>) -> Result<(), DbError> {
        let found = self.configuration.backend_type()?;
        if found != self.backend.name() {
            return Err(DbError::WrongBackend {
                expected: self.backend.name(),
                found,
            });
        }
        let connection = self.backend.open(&mut self.configuration, should_exist)?;
        self.connection = Some(connection);
        Ok(())
    }

    /// Drop the connection; the next operation reconnects.
    pub fn close(&mut self) {
        self.connection = None;
    }

    /// Close the connection and delete the backing store.
    pub(crate) fn discard(&mut self) -> Result<(), DbError> {
        self.close();
        self.backend.remove(&mut self.configuration)
    }

    /// Run `f` inside one transaction.
    ///
    /// Connects first if needed (the store must already exist). With `commit`
    /// a successful result is committed; otherwise, and on any error, the
    /// transaction is rolled back.
    pub fn with_cursor<T, E, F>(&mut self, commit: bool, f: F) -> Result<T, E>
    where
        F: FnOnce(&Cursor<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        if self.connection.is_none() {
            self.connect(Some(true))?;
        }
        let conn = self.connection.as_ref().ok_or(DbError::NotConnected)?;
        let tx = conn.unchecked_transaction().map_err(DbError::from)?;
        let cursor = Cursor {
            tx,
            dialect: self.backend.dialect(),
            tables: self.backend.tables(),
        };

        match f(&cursor) {
            Ok(value) => {
                if commit {
                    cursor.tx.commit().map_err(DbError::from)?;
                }
                Ok(value)
            }
            Err(err) => {
                log::error!("Error occurred, rolling back transaction");
                if let Err(rollback) = cursor.tx.rollback() {
                    log::warn!("Rollback failed: {}", rollback);
                }
                Err(err)
            }
        }
    }
}

// ── Cursor ──────────────────────────────────────────────────────────────────

/// An open transaction plus the SQL rules of its backend.
pub struct Cursor<'a> {
    tx: Transaction<'a>,
    dialect: &'a dyn Dialect,
    tables: &'static Tables,
}

impl Cursor<'_> {
    pub fn connection(&self) -> &Connection {
        &self.tx
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect
    }

    pub fn tables(&self) -> &'static Tables {
        self.tables
    }

    /// Execute `sql` with `bindings` as named parameters.
    pub fn execute(&self, sql: &str, bindings: &Bindings) -> Result<usize, DbError> {
        log::debug!("{}", sql);
        let named = bindings.named(self.dialect)?;
        let params = as_params(&named);
        Ok(self.tx.prepare_cached(sql)?.execute(params.as_slice())?)
    }

    /// First row of `sql`, or `None`.
    pub fn query_row<T>(
        &self,
        sql: &str,
        bindings: &Bindings,
        f: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>, DbError> {
        log::debug!("{}", sql);
        let named = bindings.named(self.dialect)?;
        let params = as_params(&named);
        Ok(self
            .tx
            .prepare_cached(sql)?
            .query_row(params.as_slice(), f)
            .optional()?)
    }

    /// Every row of `sql`, mapped by `f`.
    pub fn query_map<T>(
        &self,
        sql: &str,
        bindings: &Bindings,
        f: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, DbError> {
        log::debug!("{}", sql);
        let named = bindings.named(self.dialect)?;
        let params = as_params(&named);
        let mut stmt = self.tx.prepare_cached(sql)?;
        let rows = stmt
            .query_map(params.as_slice(), f)?
            .collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(rows)
    }
}

fn as_params(named: &[(String, Value)]) -> Vec<(&str, &dyn ToSql)> {
    named
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
