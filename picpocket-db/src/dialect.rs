//! Per-backend SQL rules: supported column types, identifier quoting and
//! bound-parameter syntax.
//!
//! Every dynamic table, column or parameter name that ends up in a statement
//! goes through [`Dialect::identifier`] or [`Dialect::placeholder`]; names are
//! validated, never sanitized.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::DbError;

/// Table or column name, optionally qualified with one dot.
static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)?$").expect("Invalid identifier regex")
});

/// Bound parameters are never qualified.
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("Invalid placeholder regex"));

/// Logical column types used by the table descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Boolean,
    DateTime,
    Id,
    Json,
    Number,
    Text,
}

/// SQL generation rules for one database backend.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Column types this backend can store natively.
    fn types(&self) -> &'static [ColumnType];

    fn supports(&self, column_type: ColumnType) -> bool {
        self.types().contains(&column_type)
    }

    /// Marker for positional parameters. Not to be mixed with
    /// [`Dialect::placeholder`] in one statement.
    fn param(&self) -> &'static str;

    /// Quote a table or column reference. `images.path` becomes
    /// `"images"."path"`.
    fn identifier(&self, name: &str) -> Result<String, DbError> {
        if !IDENTIFIER_REGEX.is_match(name) {
            return Err(DbError::UnsafeIdentifier(name.to_string()));
        }
        Ok(name
            .split('.')
            .map(|part| format!("\"{}\"", part))
            .collect::<Vec<_>>()
            .join("."))
    }

    /// Named bound-parameter token for `name`.
    fn placeholder(&self, name: &str) -> Result<String, DbError>;

    /// `"a", "b", "c"`
    fn identifiers(&self, names: &[&str]) -> Result<String, DbError> {
        join(names, |name| self.identifier(name))
    }

    /// `:a, :b, :c`
    fn placeholders(&self, names: &[&str]) -> Result<String, DbError> {
        join(names, |name| self.placeholder(name))
    }

    /// `"a" = :a, "b" = :b`
    fn assignments(&self, names: &[&str]) -> Result<String, DbError> {
        join(names, |name| {
            Ok(format!("{} = {}", self.identifier(name)?, self.placeholder(name)?))
        })
    }
}

fn join(names: &[&str], f: impl Fn(&str) -> Result<String, DbError>) -> Result<String, DbError> {
    Ok(names
        .iter()
        .map(|name| f(name))
        .collect::<Result<Vec<_>, _>>()?
        .join(", "))
}

// ── SQLite ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn types(&self) -> &'static [ColumnType] {
        &[
            ColumnType::Boolean,
            ColumnType::Id,
            ColumnType::Number,
            ColumnType::Text,
        ]
    }

    fn param(&self) -> &'static str {
        "?"
    }

    fn placeholder(&self, name: &str) -> Result<String, DbError> {
        if !PLACEHOLDER_REGEX.is_match(name) {
            return Err(DbError::UnsafePlaceholder(name.to_string()));
        }
        Ok(format!(":{}", name))
    }
}

// ── PostgreSQL ──────────────────────────────────────────────────────────────

/// PostgreSQL rules in the pyformat parameter style used by its drivers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn types(&self) -> &'static [ColumnType] {
        &[
            ColumnType::Boolean,
            ColumnType::DateTime,
            ColumnType::Id,
            ColumnType::Json,
            ColumnType::Number,
            ColumnType::Text,
        ]
    }

    fn param(&self) -> &'static str {
        "%s"
    }

    fn placeholder(&self, name: &str) -> Result<String, DbError> {
        if !PLACEHOLDER_REGEX.is_match(name) {
            return Err(DbError::UnsafePlaceholder(name.to_string()));
        }
        Ok(format!("%({})s", name))
    }
}

#[cfg(test)]
#[path = "tests/dialect_tests.rs"]
mod tests;
