use std::path::Path;

use picpocket_core::*;
use picpocket_db::Store;
use picpocket_import::*;
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

fn write(root: &Path, relative: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, relative).unwrap();
}

fn photo_library(dir: &TempDir) -> std::path::PathBuf {
    let root = dir.path().join("library");
    write(&root, "a.jpg");
    write(&root, "birds/b.PNG");
    write(&root, "birds/notes.txt");
    write(&root, "birds/deep/c.jpeg");
    root
}

#[test]
fn imports_allowed_files() {
    let (dir, mut store) = new_store();
    let root = photo_library(&dir);
    let location = store
        .add_location(&NewLocation {
            name: "library".to_string(),
            path: Some(root),
            source: true,
            ..Default::default()
        })
        .unwrap();

    let result = import_location(
        &mut store,
        &LocationRef::from("library"),
        &LocationImportOptions::default(),
        &SilentProgress,
    )
    .unwrap();
    assert_eq!(
        result.stats,
        ImportStats {
            files_seen: 4,
            staged: 3,
            skipped: 1,
            errors: 0,
        }
    );
    assert_eq!(result.image_ids.len(), 3);
    assert_eq!(store.count_images(Some(location)).unwrap(), 3);

    let image = store.find_image(location, "birds/b.PNG").unwrap().unwrap();
    assert_eq!(image.name, "b");
    assert_eq!(image.extension, "png");
    assert!(store.find_image(location, "birds/deep/c.jpeg").unwrap().is_some());
    assert!(store.find_image(location, "birds/notes.txt").unwrap().is_none());
}

#[test]
fn reimport_updates_in_place() {
    let (dir, mut store) = new_store();
    let root = photo_library(&dir);
    let location = store
        .add_location(&NewLocation {
            name: "library".to_string(),
            path: Some(root),
            source: true,
            ..Default::default()
        })
        .unwrap();
    let options = LocationImportOptions {
        batch_size: 2,
        ..Default::default()
    };

    let first = import_location(&mut store, &location.into(), &options, &LogProgress).unwrap();
    let second = import_location(&mut store, &location.into(), &options, &LogProgress).unwrap();
    assert_eq!(first.image_ids, second.image_ids);
    assert_eq!(store.count_images(None).unwrap(), 3);
}

#[test]
fn formats_option_overrides_configuration() {
    let (dir, mut store) = new_store();
    let root = photo_library(&dir);
    let location = store
        .add_location(&NewLocation {
            name: "library".to_string(),
            path: Some(root),
            source: true,
            ..Default::default()
        })
        .unwrap();

    let options = LocationImportOptions {
        formats: Some(vec!["TXT".to_string()]),
        creator: Some("Sam".to_string()),
        ..Default::default()
    };
    let result = import_location(&mut store, &location.into(), &options, &SilentProgress).unwrap();
    assert_eq!(result.stats.staged, 1);
    assert_eq!(result.stats.skipped, 3);

    let image = store.get_image(result.image_ids[0]).unwrap().unwrap();
    assert_eq!(image.path.to_str(), Some("birds/notes.txt"));
    assert_eq!(image.creator.as_deref(), Some("Sam"));
}

#[test]
fn removable_location_needs_a_mount() {
    let (dir, mut store) = new_store();
    let root = photo_library(&dir);
    store
        .add_location(&NewLocation {
            name: "card".to_string(),
            source: true,
            removable: true,
            ..Default::default()
        })
        .unwrap();
    let card = LocationRef::from("card");

    let unmounted = import_location(
        &mut store,
        &card,
        &LocationImportOptions::default(),
        &SilentProgress,
    );
    assert!(matches!(unmounted, Err(ImportError::NoRoot(name)) if name == "card"));

    store.mount(&card, &root).unwrap();
    let result = import_location(
        &mut store,
        &card,
        &LocationImportOptions::default(),
        &SilentProgress,
    )
    .unwrap();
    assert_eq!(result.stats.staged, 3);
}

#[test]
fn unknown_location() {
    let (_dir, mut store) = new_store();
    let result = import_location(
        &mut store,
        &LocationRef::from("missing"),
        &LocationImportOptions::default(),
        &SilentProgress,
    );
    assert!(matches!(result, Err(ImportError::UnknownLocation(_))));
}
