//! Task runs: pattern-driven incremental import from a source location into
//! a destination location.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use picpocket_core::{
    DestinationContext, DestinationFormat, LocationRef, MatchParams, PathPattern,
};
use picpocket_db::Store;

use crate::batch::{BatchImporter, DEFAULT_BATCH_SIZE};
use crate::error::ImportError;
use crate::files;
use crate::location::{ImportResult, allowed_formats};
use crate::progress::{ImportProgress, ImportStats};

/// Options for [`run_task`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Only consider files modified at or after this time.
    pub since: Option<DateTime<Local>>,
    /// Ignore the last run and consider every file.
    pub full: bool,
    pub batch_size: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            since: None,
            full: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// A directory waiting to be visited, with the pattern parts consumed so
/// far and the parameters collected on the way down.
struct Pending {
    directory: PathBuf,
    consumed: usize,
    params: MatchParams,
}

/// Run the task `name`.
///
/// Files below the source root are copied to the destination root and
/// imported there. Targets that already exist are left alone. The run is
/// recorded only once every staged image has been written and no file
/// failed; otherwise `last_ran` keeps its old value so failures are retried.
pub fn run_task(
    store: &mut Store,
    name: &str,
    options: &RunOptions,
    progress: &dyn ImportProgress,
) -> Result<ImportResult, ImportError> {
    let started = Local::now();

    let task = store
        .get_task(name)?
        .ok_or_else(|| ImportError::UnknownTask(name.to_string()))?;
    let source = store
        .get_location(&LocationRef::Id(task.source))?
        .ok_or_else(|| ImportError::UnknownLocation(format!("#{}", task.source)))?;
    let destination = store
        .get_location(&LocationRef::Id(task.destination))?
        .ok_or_else(|| ImportError::UnknownLocation(format!("#{}", task.destination)))?;
    let source_root = source
        .root()
        .ok_or_else(|| ImportError::NoRoot(source.name.clone()))?
        .to_path_buf();
    let destination_root = destination
        .root()
        .ok_or_else(|| ImportError::NoRoot(destination.name.clone()))?
        .to_path_buf();

    let pattern = match task.configuration.source.as_deref() {
        Some(serialized) => PathPattern::parse(serialized)?,
        None => PathPattern::default(),
    };
    let format = task
        .configuration
        .destination
        .as_deref()
        .map(DestinationFormat::parse)
        .transpose()?;
    let formats = allowed_formats(store, task.configuration.formats.as_deref())?;

    let last_ran = if options.full {
        None
    } else {
        options.since.or(task.last_ran)
    };
    match last_ran {
        Some(last_ran) => progress.on_phase(&format!(
            "Running task {} (files since {})",
            task.name,
            last_ran.format("%Y-%m-%d %H:%M:%S")
        )),
        None => progress.on_phase(&format!("Running task {} (all files)", task.name)),
    }

    let mut stats = ImportStats::default();
    let mut importer = BatchImporter::new(store, destination.id, &destination_root, options.batch_size)
        .with_creator(task.configuration.creator.clone());
    let mut index = 0usize;

    let mut pending = vec![Pending {
        directory: source_root.clone(),
        consumed: 0,
        params: MatchParams::new(last_ran),
    }];
    while let Some(Pending {
        directory,
        consumed,
        params,
    }) = pending.pop()
    {
        let entries = match read_sorted(&directory) {
            Ok(entries) => entries,
            Err(e) => {
                progress.on_error(&directory, &e);
                stats.errors += 1;
                continue;
            }
        };

        // Visited in reverse so the stack pops them in name order.
        let mut subdirectories = Vec::new();
        for path in entries {
            if path.is_dir() {
                let Some(part) = pattern.parts().get(consumed) else {
                    subdirectories.push(Pending {
                        directory: path,
                        consumed,
                        params: params.clone(),
                    });
                    continue;
                };
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                match name.and_then(|name| part.matches(&name, &params)) {
                    Some(found) => subdirectories.push(Pending {
                        directory: path,
                        consumed: consumed + 1,
                        params: params.merged(found),
                    }),
                    None => log::debug!("Pruned {}", path.display()),
                }
                continue;
            }

            if consumed < pattern.len() {
                continue;
            }
            stats.files_seen += 1;
            if !files::has_allowed_extension(&path, &formats) {
                progress.on_skip(&path, "not an allowed format");
                stats.skipped += 1;
                continue;
            }

            // Every allowed file takes an index, whether or not it is copied.
            index += 1;
            let outcome = copy_candidate(
                &path,
                &source_root,
                &destination_root,
                format.as_ref(),
                last_ran,
                index,
            )
            .and_then(|target| match target {
                Some(target) => stage_copy(&mut importer, &target).map(|()| true),
                None => Ok(false),
            });
            match outcome {
                Ok(true) => {
                    progress.on_file(&path);
                    stats.staged += 1;
                }
                Ok(false) => {
                    progress.on_skip(&path, "older than last run or already present");
                    stats.skipped += 1;
                }
                Err(e) => {
                    progress.on_error(&path, &e);
                    stats.errors += 1;
                }
            }
        }
        pending.extend(subdirectories.into_iter().rev());
    }

    importer.flush()?;
    let result = ImportResult {
        image_ids: importer.into_ids(),
        stats,
    };
    // Failed files keep their old mtimes, so moving last_ran past them would
    // hide them from every later run.
    if result.stats.errors == 0 {
        store.record_invocation(&task.name, started)?;
    } else {
        log::warn!(
            "Task {} had {} failures; last run time left unchanged",
            task.name,
            result.stats.errors
        );
    }
    progress.on_complete(&result.stats);
    Ok(result)
}

/// Import a file just copied to `target`. If its row could not be built the
/// copy is removed, so the next run does not take it for an existing image.
/// A row that is staged but not yet written keeps its copy for the next flush.
fn stage_copy(importer: &mut BatchImporter<'_>, target: &Path) -> Result<(), ImportError> {
    let staged = importer.staged();
    importer.accept(target).inspect_err(|_| {
        if importer.staged() > staged {
            return;
        }
        if let Err(e) = fs::remove_file(target) {
            log::warn!("Could not remove {}: {}", target.display(), e);
        }
    })
}

/// Entries of `directory`, sorted by name.
fn read_sorted(directory: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let mut entries = fs::read_dir(directory)
        .and_then(|entries| {
            entries
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<Result<Vec<_>, _>>()
        })
        .map_err(|e| ImportError::io(directory, e))?;
    entries.sort();
    Ok(entries)
}

/// Copy `path` into the destination when it is new enough and its target is
/// free. Returns the target when a copy was made.
fn copy_candidate(
    path: &Path,
    source_root: &Path,
    destination_root: &Path,
    format: Option<&DestinationFormat>,
    last_ran: Option<DateTime<Local>>,
    index: usize,
) -> Result<Option<PathBuf>, ImportError> {
    let modified = files::modified(path)?;
    if let Some(last_ran) = last_ran
        && modified < last_ran
    {
        return Ok(None);
    }

    let relative = path
        .strip_prefix(source_root)
        .map_err(|_| ImportError::OutsideRoot {
            path: path.to_path_buf(),
            root: source_root.to_path_buf(),
        })?;
    let target = match format {
        Some(format) => {
            let hash = if format.needs_hash() {
                Some(files::hash_file(path)?)
            } else {
                None
            };
            let context = DestinationContext {
                source: relative,
                index,
                hash: hash.as_deref(),
                modified: Some(modified),
            };
            destination_root.join(format.render(&context)?)
        }
        None => destination_root.join(relative),
    };

    if target.exists() {
        log::debug!("{} already exists", target.display());
        return Ok(None);
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| ImportError::io(parent, e))?;
    }
    fs::copy(path, &target).map_err(|e| ImportError::io(&target, e))?;
    log::debug!("Copied {} to {}", path.display(), target.display());
    Ok(Some(target))
}

#[cfg(test)]
#[path = "tests/task_tests.rs"]
mod tests;
