//! Import progress reporting.

use std::path::Path;

use crate::error::ImportError;

/// Counters for one import run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    /// Files that reached the extension/date filters.
    pub files_seen: usize,
    /// Files handed to the importer.
    pub staged: usize,
    /// Files filtered out or already present at the destination.
    pub skipped: usize,
    pub errors: usize,
}

/// Trait for receiving import progress updates.
pub trait ImportProgress {
    /// Called when a phase starts (e.g., "Running task nightly").
    fn on_phase(&self, message: &str);

    /// Called after a file has been staged for import.
    fn on_file(&self, path: &Path);

    fn on_skip(&self, path: &Path, reason: &str);

    /// Called when a single file fails; the run continues.
    fn on_error(&self, path: &Path, error: &ImportError);

    fn on_complete(&self, stats: &ImportStats);
}

/// A no-op progress reporter that discards all updates.
pub struct SilentProgress;

impl ImportProgress for SilentProgress {
    fn on_phase(&self, _message: &str) {}
    fn on_file(&self, _path: &Path) {}
    fn on_skip(&self, _path: &Path, _reason: &str) {}
    fn on_error(&self, _path: &Path, _error: &ImportError) {}
    fn on_complete(&self, _stats: &ImportStats) {}
}

/// A progress reporter that logs to the `log` crate.
pub struct LogProgress;

impl ImportProgress for LogProgress {
    fn on_phase(&self, message: &str) {
        log::info!("{}", message);
    }

    fn on_file(&self, path: &Path) {
        log::debug!("Staged {}", path.display());
    }

    fn on_skip(&self, path: &Path, reason: &str) {
        log::debug!("Skipping {}: {}", path.display(), reason);
    }

    fn on_error(&self, path: &Path, error: &ImportError) {
        log::warn!("Failed to import {}: {}", path.display(), error);
    }

    fn on_complete(&self, stats: &ImportStats) {
        log::info!(
            "Import complete: {} staged, {} skipped, {} errors",
            stats.staged,
            stats.skipped,
            stats.errors
        );
    }
}
