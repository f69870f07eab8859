use super::*;
use crate::backend::SqliteBackend;
use crate::schema::SQLITE_SCHEMA;
use crate::tables::{self, SQLITE_TABLES};
use picpocket_core::{ConfigContents, Configuration};

fn configuration(dir: &std::path::Path) -> Configuration {
    Configuration::create(dir, &ConfigContents::new("sqlite", toml::Table::new())).unwrap()
}

fn count_versions(store: &mut Store) -> i64 {
    store
        .with_cursor(false, |cursor| {
            cursor
                .query_row("SELECT COUNT(*) FROM version", &Bindings::new(), |row| row.get(0))
                .map(|count| count.unwrap_or(0))
        })
        .unwrap()
}

#[test]
fn load_picks_registered_backend() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::load(configuration(dir.path())).unwrap();
    assert_eq!(store.backend().name(), "sqlite");
    assert!(!store.is_connected());
}

#[test]
fn load_rejects_unknown_backend() {
    let dir = tempfile::tempdir().unwrap();
    let configuration =
        Configuration::create(dir.path(), &ConfigContents::new("postgres", toml::Table::new()))
            .unwrap();
    assert!(matches!(
        Store::load(configuration),
        Err(DbError::UnknownBackend(name)) if name == "postgres"
    ));
}

#[test]
fn connect_rejects_wrong_backend() {
    let dir = tempfile::tempdir().unwrap();
    let configuration =
        Configuration::create(dir.path(), &ConfigContents::new("other", toml::Table::new()))
            .unwrap();
    let mut store = Store::with_backend(Box::new(SqliteBackend::default()), configuration);
    assert!(matches!(
        store.connect(None),
        Err(DbError::WrongBackend { expected: "sqlite", .. })
    ));
}

#[test]
fn operations_require_an_existing_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::load(configuration(dir.path())).unwrap();
    let result = store.with_cursor(false, |_| Ok::<_, DbError>(()));
    assert!(matches!(result, Err(DbError::DoesNotExist(_))));
}

#[test]
fn commit_and_rollback() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::load(configuration(dir.path())).unwrap();
    store.initialize().unwrap();
    assert_eq!(count_versions(&mut store), 1);

    let version = store.api_version();

    // Ok without commit is discarded.
    store
        .with_cursor(false, |cursor| cursor.insert_version(&version))
        .unwrap();
    assert_eq!(count_versions(&mut store), 1);

    // Errors roll back even when committing.
    let result: Result<(), DbError> = store.with_cursor(true, |cursor| {
        cursor.insert_version(&version)?;
        Err(DbError::invalid("boom"))
    });
    assert!(matches!(result, Err(DbError::InvalidInput(msg)) if msg == "boom"));
    assert_eq!(count_versions(&mut store), 1);

    store
        .with_cursor(true, |cursor| cursor.insert_version(&version))
        .unwrap();
    assert_eq!(count_versions(&mut store), 2);
}

#[test]
fn statements_reject_unknown_columns_before_execution() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::load(configuration(dir.path())).unwrap();
    store.initialize().unwrap();

    let result = store.with_cursor(true, |cursor| {
        let sql = tables::insert(cursor.dialect(), &SQLITE_TABLES.locations, &["name", "owner"])?;
        cursor.execute(&sql, &Bindings::new())
    });
    assert!(matches!(result, Err(DbError::UnknownColumn { .. })));
}

#[test]
fn initialize_twice_fails_without_touching_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::load(configuration(dir.path())).unwrap();
    store.initialize().unwrap();

    let mut again = Store::load(configuration(dir.path())).unwrap();
    assert!(matches!(again.initialize(), Err(DbError::AlreadyExists(_))));

    assert_eq!(count_versions(&mut again), 1);
    assert!(again.matching_version());
}

/// SQLite with a schema script that cannot run.
#[derive(Default)]
struct BrokenSchema(SqliteBackend);

impl Backend for BrokenSchema {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn dialect(&self) -> &dyn Dialect {
        self.0.dialect()
    }

    fn tables(&self) -> &'static Tables {
        self.0.tables()
    }

    fn schema(&self) -> &'static str {
        "CREATE TABLE broken ("
    }

    fn schema_version(&self) -> picpocket_core::Version {
        self.0.schema_version()
    }

    fn parse_connection_info(&self, info: &toml::Table) -> Result<toml::Table, DbError> {
        self.0.parse_connection_info(info)
    }

    fn open(
        &self,
        configuration: &mut Configuration,
        should_exist: Option<bool>,
    ) -> Result<Connection, DbError> {
        self.0.open(configuration, should_exist)
    }

    fn remove(&self, configuration: &mut Configuration) -> Result<(), DbError> {
        self.0.remove(configuration)
    }
}

#[test]
fn failed_initialize_leaves_no_database() {
    let dir = tempfile::tempdir().unwrap();
    let database = dir.path().join(crate::backend::DEFAULT_SQLITE_FILE);

    let mut broken =
        Store::with_backend(Box::new(BrokenSchema::default()), configuration(dir.path()));
    assert!(matches!(broken.initialize(), Err(DbError::Sqlite(_))));
    assert!(!database.exists());
    assert!(!broken.is_connected());

    let mut store = Store::load(configuration(dir.path())).unwrap();
    store.initialize().unwrap();
    assert!(store.matching_version());
}

#[test]
fn version_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::load(configuration(dir.path())).unwrap();
    store.initialize().unwrap();

    assert_eq!(store.get_version().unwrap(), store.api_version());
    assert!(store.matching_version());
}

#[test]
fn latest_version_row_wins() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::load(configuration(dir.path())).unwrap();
    store.initialize().unwrap();
    let expected = store.api_version();

    let mut newer = expected.clone();
    newer.patch += 1;
    store
        .with_cursor(true, |cursor| cursor.insert_version(&newer))
        .unwrap();
    assert_eq!(store.get_version().unwrap(), newer);
    assert!(!store.matching_version());

    store
        .with_cursor(true, |cursor| cursor.insert_version(&expected))
        .unwrap();
    assert!(store.matching_version());
}

#[test]
fn every_version_field_must_match() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::load(configuration(dir.path())).unwrap();
    store.initialize().unwrap();
    let expected = store.api_version();

    let mut variants = Vec::new();
    for field in 0..3 {
        let mut up = expected.clone();
        let mut down = expected.clone();
        let (up_value, down_value) = match field {
            0 => (&mut up.major, &mut down.major),
            1 => (&mut up.minor, &mut down.minor),
            _ => (&mut up.patch, &mut down.patch),
        };
        *up_value += 1;
        let lowered = down_value.checked_sub(1);
        if let Some(lowered) = lowered {
            *down_value = lowered;
            variants.push(down);
        }
        variants.push(up);
    }
    let mut v = expected.clone();
    v.label = Some(format!("{}-1", v.label.clone().unwrap_or_default()));
    variants.push(v);
    let mut v = expected.clone();
    v.label = None;
    variants.push(v);

    for variant in variants {
        assert_ne!(variant, expected);
        store
            .with_cursor(true, |cursor| cursor.insert_version(&variant))
            .unwrap();
        assert!(!store.matching_version(), "{} matched", variant);
    }
}

#[test]
fn empty_or_missing_version_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::load(configuration(dir.path())).unwrap();

    // No database file yet.
    assert!(!store.matching_version());

    store.connect(Some(false)).unwrap();
    // Database exists but has no tables.
    assert!(!store.matching_version());

    store
        .with_cursor(true, |cursor| {
            cursor
                .connection()
                .execute_batch(SQLITE_SCHEMA)
                .map_err(DbError::from)
        })
        .unwrap();
    assert!(matches!(store.get_version(), Err(DbError::UnknownVersion)));
    assert!(!store.matching_version());
}
