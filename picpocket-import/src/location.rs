//! Import every image already present under a location.

use picpocket_core::{LocationRef, normalize_formats};
use picpocket_db::{DbError, Store};
use walkdir::WalkDir;

use crate::batch::{BatchImporter, DEFAULT_BATCH_SIZE};
use crate::error::ImportError;
use crate::files;
use crate::progress::{ImportProgress, ImportStats};

/// Options for [`import_location`].
#[derive(Debug, Clone)]
pub struct LocationImportOptions {
    pub batch_size: usize,
    pub creator: Option<String>,
    /// Extension allow-list; the configuration's `files.formats` if `None`.
    pub formats: Option<Vec<String>>,
}

impl Default for LocationImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            creator: None,
            formats: None,
        }
    }
}

/// Result of an import run.
#[derive(Debug, Default)]
pub struct ImportResult {
    /// Ids of every image written, in import order.
    pub image_ids: Vec<i64>,
    pub stats: ImportStats,
}

/// Extension allow-list: `formats` if given, else the configuration's.
pub(crate) fn allowed_formats(
    store: &mut Store,
    formats: Option<&[String]>,
) -> Result<Vec<String>, ImportError> {
    match formats {
        Some(formats) if !formats.is_empty() => Ok(normalize_formats(formats)),
        _ => {
            let contents = store.configuration().contents().map_err(DbError::from)?;
            Ok(normalize_formats(&contents.files.formats))
        }
    }
}

/// Walk the location's root (its mount point if mounted) and import every
/// file with an allowed extension. Files that fail are reported and skipped.
pub fn import_location(
    store: &mut Store,
    location: &LocationRef,
    options: &LocationImportOptions,
    progress: &dyn ImportProgress,
) -> Result<ImportResult, ImportError> {
    let found = store
        .get_location(location)?
        .ok_or_else(|| ImportError::UnknownLocation(location.to_string()))?;
    let root = found
        .root()
        .ok_or_else(|| ImportError::NoRoot(found.name.clone()))?
        .to_path_buf();
    let formats = allowed_formats(store, options.formats.as_deref())?;

    progress.on_phase(&format!("Importing {} from {}", found.name, root.display()));

    let mut stats = ImportStats::default();
    let mut importer = BatchImporter::new(store, found.id, &root, options.batch_size)
        .with_creator(options.creator.clone());

    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                stats.errors += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        stats.files_seen += 1;
        if !files::has_allowed_extension(path, &formats) {
            progress.on_skip(path, "not an allowed format");
            stats.skipped += 1;
            continue;
        }

        match importer.accept(path) {
            Ok(()) => {
                progress.on_file(path);
                stats.staged += 1;
            }
            Err(e) => {
                progress.on_error(path, &e);
                stats.errors += 1;
            }
        }
    }

    importer.flush()?;
    let result = ImportResult {
        image_ids: importer.into_ids(),
        stats,
    };
    progress.on_complete(&result.stats);
    Ok(result)
}
