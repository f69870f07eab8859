use super::*;
use picpocket_core::ConfigContents;

fn connection(pairs: &[(&str, toml::Value)]) -> toml::Table {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn registry_knows_sqlite() {
    assert_eq!(backend_names(), vec!["sqlite"]);
    assert_eq!(backend("sqlite").unwrap().name(), "sqlite");
}

#[test]
fn registry_rejects_unknown_backends() {
    assert!(matches!(backend("postgres"), Err(DbError::UnknownBackend(name)) if name == "postgres"));
    assert!(matches!(backend(""), Err(DbError::UnknownBackend(_))));
}

#[test]
fn connection_info_defaults_path() {
    let parsed = SqliteBackend::default()
        .parse_connection_info(&toml::Table::new())
        .unwrap();
    assert_eq!(
        parsed.get("path"),
        Some(&toml::Value::String(DEFAULT_SQLITE_FILE.to_string()))
    );
}

#[test]
fn connection_info_keeps_relative_path() {
    let info = connection(&[("path", toml::Value::String("db/pics.sqlite".into()))]);
    let parsed = SqliteBackend::default().parse_connection_info(&info).unwrap();
    assert_eq!(parsed, info);
}

#[test]
fn connection_info_rejects_unknown_keys() {
    let info = connection(&[
        ("path", toml::Value::String("a.sqlite".into())),
        ("user", toml::Value::String("me".into())),
        ("host", toml::Value::String("localhost".into())),
    ]);
    let err = SqliteBackend::default().parse_connection_info(&info).unwrap_err();
    match err {
        DbError::InvalidConnection(msg) => assert!(msg.contains("host, user"), "{}", msg),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn connection_info_rejects_non_string_path() {
    let info = connection(&[("path", toml::Value::Integer(3))]);
    assert!(matches!(
        SqliteBackend::default().parse_connection_info(&info),
        Err(DbError::InvalidConnection(_))
    ));
}

#[test]
fn relative_paths_resolve_against_configuration_directory() {
    let dir = tempfile::tempdir().unwrap();
    let info = connection(&[("path", toml::Value::String("nested/pics.sqlite".into()))]);
    let mut configuration =
        Configuration::create(dir.path(), &ConfigContents::new("sqlite", info)).unwrap();

    let path = SqliteBackend::default().database_path(&mut configuration).unwrap();
    assert_eq!(path, dir.path().join("nested/pics.sqlite"));
}

#[test]
fn open_respects_existence_expectations() {
    let dir = tempfile::tempdir().unwrap();
    let mut configuration =
        Configuration::create(dir.path(), &ConfigContents::new("sqlite", toml::Table::new()))
            .unwrap();
    let backend = SqliteBackend::default();

    assert!(matches!(
        backend.open(&mut configuration, Some(true)),
        Err(DbError::DoesNotExist(_))
    ));

    backend.open(&mut configuration, Some(false)).unwrap();
    assert!(dir.path().join(DEFAULT_SQLITE_FILE).is_file());

    assert!(matches!(
        backend.open(&mut configuration, Some(false)),
        Err(DbError::AlreadyExists(_))
    ));
    backend.open(&mut configuration, Some(true)).unwrap();
    backend.open(&mut configuration, None).unwrap();
}
