//! Storage engine for the PicPocket catalog.
//!
//! SQL is generated from static table descriptors through a per-backend
//! [`Dialect`]; every operation runs inside a [`Store::with_cursor`]
//! transaction. SQLite (via rusqlite with the bundled feature) is the
//! registered backend.

pub mod backend;
pub mod dialect;
pub mod error;
pub mod images;
pub mod locations;
pub mod schema;
pub mod store;
pub mod tables;
pub mod tasks;

pub use backend::{Backend, DEFAULT_SQLITE_FILE, SqliteBackend, backend, backend_names};
pub use dialect::{ColumnType, Dialect, PostgresDialect, SqliteDialect};
pub use error::DbError;
pub use schema::SQLITE_SCHEMA;
pub use store::{Cursor, Store};
pub use tables::{Bindings, SQLITE_TABLES, TableDescriptor, Tables};
