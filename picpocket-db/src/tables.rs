//! Static table descriptors and the statement builders that use them.
//!
//! Statements are generated from a descriptor plus a column list. Any column
//! not present in the descriptor is rejected before SQL is produced.

use rusqlite::types::Value;

use crate::dialect::{ColumnType, Dialect};
use crate::error::DbError;

// ── Descriptors ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: &'static str,
    pub columns: &'static [(&'static str, ColumnType)],
}

impl TableDescriptor {
    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, ty)| *ty)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(name, _)| *name).collect()
    }

    /// Fail on the first column this table does not have.
    pub fn check(&self, columns: &[&str]) -> Result<(), DbError> {
        match columns.iter().find(|c| self.column_type(c).is_none()) {
            Some(column) => Err(DbError::UnknownColumn {
                table: self.name,
                column: column.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// All persistent tables for one backend.
#[derive(Debug, Clone, Copy)]
pub struct Tables {
    pub locations: TableDescriptor,
    pub images: TableDescriptor,
    pub tasks: TableDescriptor,
    pub task_invocations: TableDescriptor,
    pub version: TableDescriptor,
}

impl Tables {
    pub fn all(&self) -> [&TableDescriptor; 5] {
        [
            &self.locations,
            &self.images,
            &self.tasks,
            &self.task_invocations,
            &self.version,
        ]
    }
}

pub static SQLITE_TABLES: Tables = Tables {
    locations: TableDescriptor {
        name: "locations",
        columns: &[
            ("id", ColumnType::Id),
            ("name", ColumnType::Text),
            ("description", ColumnType::Text),
            ("path", ColumnType::Text),
            ("source", ColumnType::Boolean),
            ("destination", ColumnType::Boolean),
            ("removable", ColumnType::Boolean),
        ],
    },
    images: TableDescriptor {
        name: "images",
        columns: &[
            ("id", ColumnType::Id),
            ("name", ColumnType::Text),
            ("extension", ColumnType::Text),
            ("width", ColumnType::Number),
            ("height", ColumnType::Number),
            ("creator", ColumnType::Text),
            ("location", ColumnType::Id),
            ("path", ColumnType::Text),
            ("title", ColumnType::Text),
            ("caption", ColumnType::Text),
            ("alt", ColumnType::Text),
            ("rating", ColumnType::Number),
            ("hash", ColumnType::Text),
            ("creation_date", ColumnType::Number),
            ("last_modified", ColumnType::Number),
            ("exif", ColumnType::Text),
        ],
    },
    tasks: TableDescriptor {
        name: "tasks",
        columns: &[
            ("name", ColumnType::Text),
            ("description", ColumnType::Text),
            ("source", ColumnType::Id),
            ("destination", ColumnType::Id),
            ("configuration", ColumnType::Text),
        ],
    },
    task_invocations: TableDescriptor {
        name: "task_invocations",
        columns: &[("task", ColumnType::Text), ("last_ran", ColumnType::Number)],
    },
    version: TableDescriptor {
        name: "version",
        columns: &[
            ("id", ColumnType::Id),
            ("major", ColumnType::Number),
            ("minor", ColumnType::Number),
            ("patch", ColumnType::Number),
            ("label", ColumnType::Text),
        ],
    },
};

// ── Bound values ────────────────────────────────────────────────────────────

/// Column values for a statement, bound by name.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: Vec<(&'static str, Value)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: &'static str, value: impl Into<Value>) {
        self.values.push((column, value.into()));
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.values.iter().map(|(column, _)| *column).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values keyed by the dialect's placeholder tokens.
    pub fn named(&self, dialect: &dyn Dialect) -> Result<Vec<(String, Value)>, DbError> {
        self.values
            .iter()
            .map(|(column, value)| Ok((dialect.placeholder(column)?, value.clone())))
            .collect()
    }
}

// ── Statement builders ──────────────────────────────────────────────────────

/// `INSERT INTO "t" ("a", "b") VALUES (:a, :b)`
pub fn insert(
    dialect: &dyn Dialect,
    table: &TableDescriptor,
    columns: &[&str],
) -> Result<String, DbError> {
    table.check(columns)?;
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.identifier(table.name)?,
        dialect.identifiers(columns)?,
        dialect.placeholders(columns)?,
    ))
}

/// `SELECT "a", "b" FROM "t" [WHERE "key" = :key]`
pub fn select(
    dialect: &dyn Dialect,
    table: &TableDescriptor,
    columns: &[&str],
    key: Option<&str>,
) -> Result<String, DbError> {
    table.check(columns)?;
    let mut sql = format!(
        "SELECT {} FROM {}",
        dialect.identifiers(columns)?,
        dialect.identifier(table.name)?,
    );
    if let Some(key) = key {
        sql.push_str(&format!(" WHERE {}", where_equal(dialect, table, key)?));
    }
    Ok(sql)
}

/// `UPDATE "t" SET "a" = :a WHERE "key" = :key`
pub fn update(
    dialect: &dyn Dialect,
    table: &TableDescriptor,
    columns: &[&str],
    key: &str,
) -> Result<String, DbError> {
    table.check(columns)?;
    if columns.is_empty() {
        return Err(DbError::invalid("No columns to update"));
    }
    Ok(format!(
        "UPDATE {} SET {} WHERE {}",
        dialect.identifier(table.name)?,
        dialect.assignments(columns)?,
        where_equal(dialect, table, key)?,
    ))
}

/// `DELETE FROM "t" WHERE "key" = :key`
pub fn delete(dialect: &dyn Dialect, table: &TableDescriptor, key: &str) -> Result<String, DbError> {
    Ok(format!(
        "DELETE FROM {} WHERE {}",
        dialect.identifier(table.name)?,
        where_equal(dialect, table, key)?,
    ))
}

/// `"key" = :key`, checked against the table.
pub fn where_equal(
    dialect: &dyn Dialect,
    table: &TableDescriptor,
    key: &str,
) -> Result<String, DbError> {
    table.check(&[key])?;
    Ok(format!("{} = {}", dialect.identifier(key)?, dialect.placeholder(key)?))
}

#[cfg(test)]
#[path = "tests/tables_tests.rs"]
mod tests;
