//! Batched image import into one location.
//!
//! Rows are built as files are accepted but only written at batch
//! boundaries, each batch in its own transaction.

use std::path::{Path, PathBuf};

use picpocket_core::NewImage;
use picpocket_db::Store;

use crate::error::ImportError;
use crate::files;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

pub struct BatchImporter<'a> {
    store: &'a mut Store,
    location: i64,
    root: PathBuf,
    creator: Option<String>,
    batch_size: usize,
    staged: Vec<NewImage>,
    committed: Vec<i64>,
}

impl<'a> BatchImporter<'a> {
    /// Import into `location`, whose files live under `root`. A batch size
    /// of zero is treated as one.
    pub fn new(store: &'a mut Store, location: i64, root: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            store,
            location,
            root: root.into(),
            creator: None,
            batch_size: batch_size.max(1),
            staged: Vec::new(),
            committed: Vec::new(),
        }
    }

    /// Creator recorded on images that don't have one yet.
    pub fn with_creator(mut self, creator: Option<String>) -> Self {
        self.creator = creator;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stage `path`, writing the batch once it is full.
    ///
    /// If the file can't be read nothing changes and the importer stays
    /// usable. If writing the batch fails the staged rows are kept for the
    /// next attempt.
    pub fn accept(&mut self, path: &Path) -> Result<(), ImportError> {
        let row = files::image_row(self.location, &self.root, path, self.creator.as_deref())?;
        self.staged.push(row);
        if self.staged.len() >= self.batch_size {
            self.commit()?;
        }
        Ok(())
    }

    /// Write any staged rows and return every id committed so far.
    pub fn flush(&mut self) -> Result<&[i64], ImportError> {
        if !self.staged.is_empty() {
            self.commit()?;
        }
        Ok(&self.committed)
    }

    /// Ids committed so far, in import order.
    pub fn committed(&self) -> &[i64] {
        &self.committed
    }

    pub fn staged(&self) -> usize {
        self.staged.len()
    }

    pub fn into_ids(self) -> Vec<i64> {
        self.committed
    }

    fn commit(&mut self) -> Result<(), ImportError> {
        log::debug!("Committing {} images", self.staged.len());
        let ids = self.store.insert_images(&self.staged)?;
        self.committed.extend(ids);
        self.staged.clear();
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/batch_tests.rs"]
mod tests;
