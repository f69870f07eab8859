//! Schema creation and version bookkeeping.

use picpocket_core::Version;

use crate::error::DbError;
use crate::store::{Cursor, Store};
use crate::tables::{self, Bindings};

pub const SQLITE_SCHEMA: &str = include_str!("../sql/sqlite_schema.sql");

const VERSION_COLUMNS: &[&str] = &["major", "minor", "patch", "label"];

impl Store {
    /// Create a new, empty catalog and stamp it with the compiled-in schema
    /// version. Fails if the backing store already exists. If creating the
    /// schema fails the new backing store is removed again.
    pub fn initialize(&mut self) -> Result<(), DbError> {
        self.connect(Some(false))?;
        let schema = self.backend().schema();
        let version = self.backend().schema_version();
        log::info!("Creating {} catalog at version {}", self.backend().name(), version);
        self.with_cursor(true, |cursor| {
            cursor.connection().execute_batch(schema)?;
            cursor.insert_version(&version)
        })
        .inspect_err(|_| {
            if let Err(e) = self.discard() {
                log::warn!("Could not remove the half-created catalog: {}", e);
            }
        })
    }

    /// The most recently recorded schema version.
    pub fn get_version(&mut self) -> Result<Version, DbError> {
        self.with_cursor(false, |cursor| cursor.latest_version())?
            .ok_or(DbError::UnknownVersion)
    }

    /// Whether the stored schema version is the one this build expects.
    /// Never fails; any problem reading the version counts as a mismatch.
    pub fn matching_version(&mut self) -> bool {
        let expected = self.backend().schema_version();
        match self.get_version() {
            Ok(found) => {
                if found != expected {
                    log::warn!("Database version {} does not match {}", found, expected);
                }
                found == expected
            }
            Err(DbError::UnknownVersion) => {
                log::error!("Database doesn't contain version info");
                false
            }
            Err(err) => {
                log::error!("Checking version failed: {}", err);
                false
            }
        }
    }

    /// Schema version this build reads and writes.
    pub fn api_version(&self) -> Version {
        self.backend().schema_version()
    }
}

impl Cursor<'_> {
    pub fn insert_version(&self, version: &Version) -> Result<(), DbError> {
        let sql = tables::insert(self.dialect(), &self.tables().version, VERSION_COLUMNS)?;
        let bindings = Bindings::new()
            .set("major", version.major)
            .set("minor", version.minor)
            .set("patch", version.patch)
            .set("label", version.label.clone());
        self.execute(&sql, &bindings)?;
        Ok(())
    }

    pub fn latest_version(&self) -> Result<Option<Version>, DbError> {
        let dialect = self.dialect();
        let sql = format!(
            "{} ORDER BY {} DESC LIMIT 1",
            tables::select(dialect, &self.tables().version, VERSION_COLUMNS, None)?,
            dialect.identifier("id")?,
        );
        self.query_row(&sql, &Bindings::new(), |row| {
            Ok(Version {
                major: row.get(0)?,
                minor: row.get(1)?,
                patch: row.get(2)?,
                label: row.get(3)?,
            })
        })
    }
}
