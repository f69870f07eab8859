use super::*;

#[test]
fn quotes_plain_and_dotted_identifiers() {
    let dialect = SqliteDialect;
    assert_eq!(dialect.identifier("images").unwrap(), "\"images\"");
    assert_eq!(dialect.identifier("images.path").unwrap(), "\"images\".\"path\"");
    assert_eq!(dialect.identifier("last_ran_2").unwrap(), "\"last_ran_2\"");
}

#[test]
fn rejects_unsafe_identifiers() {
    let dialect = SqliteDialect;
    for name in [
        "",
        "a.b.c",
        ".path",
        "images.",
        "name\"; DROP TABLE images; --",
        "two words",
        "hy-phen",
    ] {
        assert!(
            matches!(dialect.identifier(name), Err(DbError::UnsafeIdentifier(_))),
            "accepted {:?}",
            name
        );
    }
}

#[test]
fn sqlite_placeholders() {
    let dialect = SqliteDialect;
    assert_eq!(dialect.placeholder("name").unwrap(), ":name");
    assert_eq!(dialect.param(), "?");
    assert!(matches!(
        dialect.placeholder("images.path"),
        Err(DbError::UnsafePlaceholder(_))
    ));
    assert!(dialect.placeholder("a b").is_err());
}

#[test]
fn postgres_placeholders() {
    let dialect = PostgresDialect;
    assert_eq!(dialect.placeholder("name").unwrap(), "%(name)s");
    assert_eq!(dialect.param(), "%s");
    assert!(dialect.placeholder("x)s; --").is_err());
}

#[test]
fn identifier_quoting_is_shared() {
    assert_eq!(
        SqliteDialect.identifier("tasks.name").unwrap(),
        PostgresDialect.identifier("tasks.name").unwrap()
    );
}

#[test]
fn supported_types() {
    assert!(SqliteDialect.supports(ColumnType::Text));
    assert!(!SqliteDialect.supports(ColumnType::Json));
    assert!(!SqliteDialect.supports(ColumnType::DateTime));
    assert!(PostgresDialect.supports(ColumnType::Json));
    assert!(PostgresDialect.supports(ColumnType::DateTime));
}

#[test]
fn list_helpers() {
    let dialect = SqliteDialect;
    assert_eq!(dialect.identifiers(&["a", "b"]).unwrap(), "\"a\", \"b\"");
    assert_eq!(dialect.placeholders(&["a", "b"]).unwrap(), ":a, :b");
    assert_eq!(
        dialect.assignments(&["a", "b"]).unwrap(),
        "\"a\" = :a, \"b\" = :b"
    );
    assert_eq!(
        PostgresDialect.assignments(&["a"]).unwrap(),
        "\"a\" = %(a)s"
    );
    assert!(dialect.identifiers(&["ok", "not ok"]).is_err());
}
