//! Importing image files into the PicPocket catalog.
//!
//! [`import_location`] indexes files already sitting under a location;
//! [`run_task`] copies new files from a task's source into its destination
//! and indexes the copies. Both feed a [`BatchImporter`].

pub mod batch;
pub mod error;
pub mod files;
pub mod location;
pub mod progress;
pub mod task;

pub use batch::{BatchImporter, DEFAULT_BATCH_SIZE};
pub use error::ImportError;
pub use location::{ImportResult, LocationImportOptions, import_location};
pub use progress::{ImportProgress, ImportStats, LogProgress, SilentProgress};
pub use task::{RunOptions, run_task};
