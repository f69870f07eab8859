use chrono::{Local, TimeZone};
use picpocket_core::*;
use picpocket_db::*;
use tempfile::TempDir;

fn new_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let configuration =
        Configuration::create(dir.path(), &ConfigContents::new("sqlite", toml::Table::new()))
            .unwrap();
    let mut store = Store::load(configuration).unwrap();
    store.initialize().unwrap();
    (dir, store)
}

fn add_dir_location(store: &mut Store, dir: &TempDir, name: &str) -> i64 {
    let path = dir.path().join(name);
    std::fs::create_dir_all(&path).unwrap();
    store
        .add_location(&NewLocation {
            name: name.to_string(),
            path: Some(path),
            source: true,
            destination: true,
            removable: false,
            ..Default::default()
        })
        .unwrap()
}

fn new_image(location: i64, path: &str) -> NewImage {
    let name = path.rsplit('/').next().unwrap().split('.').next().unwrap();
    NewImage {
        location,
        path: path.to_string(),
        name: name.to_string(),
        extension: "jpg".to_string(),
        hash: format!("hash-{}", path),
        width: Some(4),
        height: Some(3),
        creator: None,
        creation_date: 1_700_000_000,
        last_modified: 1_700_000_000,
        exif: "{}".to_string(),
    }
}

// ── Locations ───────────────────────────────────────────────────────────────

#[test]
fn add_and_get_location() {
    let (dir, mut store) = new_store();
    let id = add_dir_location(&mut store, &dir, "photos");

    let by_id = store.get_location(&LocationRef::Id(id)).unwrap().unwrap();
    let by_name = store.get_location(&LocationRef::from("photos")).unwrap().unwrap();
    assert_eq!(by_id, by_name);
    assert_eq!(by_id.name, "photos");
    assert!(by_id.path.as_ref().unwrap().is_absolute());
    assert!(by_id.source && by_id.destination && !by_id.removable);

    assert!(store.get_location(&LocationRef::from("nope")).unwrap().is_none());
    assert_eq!(store.list_locations().unwrap().len(), 1);
}

#[test]
fn add_location_validation() {
    let (dir, mut store) = new_store();

    let neither = NewLocation {
        name: "x".to_string(),
        removable: true,
        ..Default::default()
    };
    assert!(matches!(store.add_location(&neither), Err(DbError::InvalidInput(_))));

    let no_path = NewLocation {
        name: "x".to_string(),
        source: true,
        removable: false,
        ..Default::default()
    };
    assert!(matches!(store.add_location(&no_path), Err(DbError::InvalidInput(_))));

    let missing_dir = NewLocation {
        name: "x".to_string(),
        source: true,
        path: Some(dir.path().join("missing")),
        ..Default::default()
    };
    assert!(matches!(store.add_location(&missing_dir), Err(DbError::InvalidInput(_))));

    let removable = NewLocation {
        name: "card".to_string(),
        source: true,
        removable: true,
        ..Default::default()
    };
    let id = store.add_location(&removable).unwrap();
    let card = store.get_location(&id.into()).unwrap().unwrap();
    assert_eq!(card.path, None);
    assert_eq!(card.root(), None);

    assert!(store.add_location(&removable).is_err(), "names are unique");
}

#[test]
fn edit_location() {
    let (dir, mut store) = new_store();
    let id = add_dir_location(&mut store, &dir, "photos");

    let edit = LocationEdit {
        name: Some("pictures".to_string()),
        description: Some(Some("family".to_string())),
        destination: Some(false),
        ..Default::default()
    };
    store.edit_location(&id.into(), &edit).unwrap();

    let location = store.get_location(&id.into()).unwrap().unwrap();
    assert_eq!(location.name, "pictures");
    assert_eq!(location.description.as_deref(), Some("family"));
    assert!(location.source && !location.destination);

    let clear = LocationEdit {
        description: Some(None),
        ..Default::default()
    };
    store.edit_location(&"pictures".into(), &clear).unwrap();
    assert_eq!(store.get_location(&id.into()).unwrap().unwrap().description, None);

    assert!(matches!(
        store.edit_location(&id.into(), &LocationEdit::default()),
        Err(DbError::InvalidInput(_))
    ));
    let neither = LocationEdit {
        source: Some(false),
        ..Default::default()
    };
    assert!(store.edit_location(&id.into(), &neither).is_err());
    assert!(matches!(
        store.edit_location(&LocationRef::Id(999), &clear),
        Err(DbError::NotFound { .. })
    ));
}

#[test]
fn remove_location_with_images_needs_force() {
    let (dir, mut store) = new_store();
    let id = add_dir_location(&mut store, &dir, "photos");
    store.insert_images(&[new_image(id, "a.jpg")]).unwrap();

    assert!(matches!(
        store.remove_location(&id.into(), false),
        Err(DbError::DataIntegrity(_))
    ));
    assert_eq!(store.count_images(Some(id)).unwrap(), 1);

    assert!(store.remove_location(&id.into(), true).unwrap());
    assert_eq!(store.count_images(None).unwrap(), 0);
    assert!(!store.remove_location(&id.into(), true).unwrap());
}

#[test]
fn mount_overrides_path() {
    let (dir, mut store) = new_store();
    let id = add_dir_location(&mut store, &dir, "photos");
    let elsewhere = dir.path().join("elsewhere");
    std::fs::create_dir(&elsewhere).unwrap();

    store.mount(&id.into(), &elsewhere).unwrap();
    let location = store.get_location(&id.into()).unwrap().unwrap();
    assert_eq!(location.root(), Some(elsewhere.as_path()));
    assert_eq!(location.path, Some(dir.path().join("photos")));

    store.unmount(&"photos".into()).unwrap();
    let location = store.get_location(&id.into()).unwrap().unwrap();
    assert_eq!(location.root(), Some(dir.path().join("photos").as_path()));

    assert!(store.mount(&id.into(), dir.path().join("missing")).is_err());
    assert!(matches!(
        store.mount(&"nope".into(), &elsewhere),
        Err(DbError::NotFound { .. })
    ));
}

// ── Images ──────────────────────────────────────────────────────────────────

#[test]
fn insert_and_find_images() {
    let (dir, mut store) = new_store();
    let id = add_dir_location(&mut store, &dir, "photos");

    let ids = store
        .insert_images(&[new_image(id, "a.jpg"), new_image(id, "sub/b.jpg")])
        .unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(store.count_images(Some(id)).unwrap(), 2);

    let found = store.find_image(id, "sub/b.jpg").unwrap().unwrap();
    assert_eq!(found.id, ids[1]);
    assert_eq!(found.name, "b");
    assert_eq!(found.width, Some(4));
    assert_eq!(store.get_image(ids[0]).unwrap().unwrap().path.to_str(), Some("a.jpg"));
    assert!(store.find_image(id, "c.jpg").unwrap().is_none());
    assert!(store.insert_images(&[]).unwrap().is_empty());
}

#[test]
fn reimport_updates_file_fields_and_keeps_user_fields() {
    let (dir, mut store) = new_store();
    let id = add_dir_location(&mut store, &dir, "photos");

    let mut image = new_image(id, "a.jpg");
    image.creator = Some("Importer".to_string());
    let first = store.insert_images(&[image.clone()]).unwrap()[0];

    store
        .edit_image(
            first,
            &ImageEdit {
                title: Some(Some("Sunset".to_string())),
                rating: Some(Some(5)),
                ..Default::default()
            },
        )
        .unwrap();

    image.hash = "changed".to_string();
    image.creator = Some("Someone else".to_string());
    let second = store.insert_images(&[image]).unwrap()[0];
    assert_eq!(first, second);

    let stored = store.get_image(first).unwrap().unwrap();
    assert_eq!(stored.hash.as_deref(), Some("changed"));
    assert_eq!(stored.creator.as_deref(), Some("Importer"));
    assert_eq!(stored.title.as_deref(), Some("Sunset"));
    assert_eq!(stored.rating, Some(5));
    assert_eq!(store.count_images(None).unwrap(), 1);
}

#[test]
fn failed_batch_inserts_nothing() {
    let (dir, mut store) = new_store();
    let id = add_dir_location(&mut store, &dir, "photos");

    let result = store.insert_images(&[new_image(id, "a.jpg"), new_image(id + 100, "b.jpg")]);
    assert!(result.is_err());
    assert_eq!(store.count_images(None).unwrap(), 0);
}

#[test]
fn edit_and_remove_image() {
    let (dir, mut store) = new_store();
    let id = add_dir_location(&mut store, &dir, "photos");
    let image = store.insert_images(&[new_image(id, "a.jpg")]).unwrap()[0];

    assert!(matches!(
        store.edit_image(image, &ImageEdit::default()),
        Err(DbError::InvalidInput(_))
    ));
    assert!(matches!(
        store.edit_image(
            image + 1,
            &ImageEdit {
                alt: Some(Some("x".into())),
                ..Default::default()
            }
        ),
        Err(DbError::NotFound { .. })
    ));

    assert!(store.remove_image(image).unwrap());
    assert!(!store.remove_image(image).unwrap());
    assert!(store.get_image(image).unwrap().is_none());
}

// ── Tasks ───────────────────────────────────────────────────────────────────

fn new_task(name: &str) -> NewTask {
    NewTask {
        name: name.to_string(),
        description: Some("nightly".to_string()),
        source: Some("source".into()),
        destination: Some("destination".into()),
        configuration: TaskConfiguration {
            source: Some("{year}/{month}".to_string()),
            destination: Some("{date:%Y}/{file}".to_string()),
            creator: Some("Me".to_string()),
            formats: Some(vec!["JPG".to_string(), ".png".to_string()]),
        },
    }
}

fn task_store() -> (TempDir, Store) {
    let (dir, mut store) = new_store();
    add_dir_location(&mut store, &dir, "source");
    add_dir_location(&mut store, &dir, "destination");
    (dir, store)
}

#[test]
fn add_and_get_task() {
    let (_dir, mut store) = task_store();
    store.add_task(&new_task("sync"), false).unwrap();

    let task = store.get_task("sync").unwrap().unwrap();
    assert_eq!(task.description.as_deref(), Some("nightly"));
    assert_eq!(task.configuration.source.as_deref(), Some("{year}/{month}"));
    assert_eq!(
        task.configuration.formats,
        Some(vec![".jpg".to_string(), ".png".to_string()])
    );
    assert_eq!(task.last_ran, None);
    assert_ne!(task.source, task.destination);

    assert!(store.get_task("other").unwrap().is_none());
    assert_eq!(store.list_tasks().unwrap().len(), 1);
}

#[test]
fn add_task_validation() {
    let (_dir, mut store) = task_store();

    let mut task = new_task("bad");
    task.configuration.source = Some("{century}".to_string());
    assert!(matches!(store.add_task(&task, false), Err(DbError::Pattern(_))));

    let mut task = new_task("bad");
    task.configuration.destination = Some("{uuid}.jpg".to_string());
    assert!(matches!(store.add_task(&task, false), Err(DbError::Format(_))));

    let mut task = new_task("bad");
    task.source = Some("missing".into());
    assert!(matches!(store.add_task(&task, false), Err(DbError::NotFound { .. })));

    let mut task = new_task("bad");
    task.destination = None;
    assert!(matches!(store.add_task(&task, false), Err(DbError::InvalidInput(_))));

    assert!(store.list_tasks().unwrap().is_empty());
}

#[test]
fn duplicate_task_requires_force_and_resets_last_ran() {
    let (_dir, mut store) = task_store();
    store.add_task(&new_task("sync"), false).unwrap();
    let when = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    store.record_invocation("sync", when).unwrap();

    let mut changed = new_task("sync");
    changed.description = Some("changed".to_string());
    assert!(matches!(
        store.add_task(&changed, false),
        Err(DbError::Duplicate { entity_type: "task", .. })
    ));
    let task = store.get_task("sync").unwrap().unwrap();
    assert_eq!(task.description.as_deref(), Some("nightly"));
    assert_eq!(task.last_ran, Some(when));

    store.add_task(&changed, true).unwrap();
    let task = store.get_task("sync").unwrap().unwrap();
    assert_eq!(task.description.as_deref(), Some("changed"));
    assert_eq!(task.last_ran, None);
}

#[test]
fn last_ran_never_decreases() {
    let (_dir, mut store) = task_store();
    store.add_task(&new_task("sync"), false).unwrap();
    assert_eq!(store.get_last_ran("sync").unwrap(), None);

    let early = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let late = Local.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

    store.record_invocation("sync", late).unwrap();
    assert_eq!(store.get_last_ran("sync").unwrap(), Some(late));

    store.record_invocation("sync", early).unwrap();
    assert_eq!(store.get_last_ran("sync").unwrap(), Some(late));

    let later = Local.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
    store.record_invocation("sync", later).unwrap();
    assert_eq!(store.get_last_ran("sync").unwrap(), Some(later));

    assert!(matches!(
        store.record_invocation("missing", later),
        Err(DbError::NotFound { .. })
    ));
}

#[test]
fn remove_task_drops_invocation() {
    let (_dir, mut store) = task_store();
    store.add_task(&new_task("sync"), false).unwrap();
    store
        .record_invocation("sync", Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        .unwrap();

    assert!(store.remove_task("sync").unwrap());
    assert!(!store.remove_task("sync").unwrap());
    assert_eq!(store.get_last_ran("sync").unwrap(), None);

    store.add_task(&new_task("sync"), false).unwrap();
    assert_eq!(store.get_task("sync").unwrap().unwrap().last_ran, None);
}
