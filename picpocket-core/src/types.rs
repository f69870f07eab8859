//! Data model types for the media catalog.
//!
//! These mirror the persistent tables: locations, images, tasks and task
//! invocations. Timestamps stored in the database are unix seconds.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// ── Location ────────────────────────────────────────────────────────────────

/// A registered filesystem root usable as an import source and/or destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// `None` for removable storage that has to be mounted before use.
    pub path: Option<PathBuf>,
    pub source: bool,
    pub destination: bool,
    pub removable: bool,
    /// Session-only override of `path`, set by mounting.
    #[serde(skip)]
    pub mount_point: Option<PathBuf>,
}

impl Location {
    /// Where the location's files currently live: the mount point if mounted,
    /// else the stored path.
    pub fn root(&self) -> Option<&Path> {
        self.mount_point.as_deref().or(self.path.as_deref())
    }
}

/// Fields for registering a new location.
#[derive(Debug, Clone, Default)]
pub struct NewLocation {
    pub name: String,
    pub path: Option<PathBuf>,
    pub description: Option<String>,
    pub source: bool,
    pub destination: bool,
    pub removable: bool,
}

/// Partial update of a location. `None` leaves a field untouched; the nested
/// options on `path`/`description` allow clearing them.
#[derive(Debug, Clone, Default)]
pub struct LocationEdit {
    pub name: Option<String>,
    pub path: Option<Option<PathBuf>>,
    pub description: Option<Option<String>>,
    pub source: Option<bool>,
    pub destination: Option<bool>,
    pub removable: Option<bool>,
}

impl LocationEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.path.is_none()
            && self.description.is_none()
            && self.source.is_none()
            && self.destination.is_none()
            && self.removable.is_none()
    }
}

/// Locations are addressed either by numeric id or by unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationRef {
    Id(i64),
    Name(String),
}

impl LocationRef {
    /// Numeric strings become ids, everything else a name.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(raw.to_string()),
        }
    }
}

impl From<i64> for LocationRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for LocationRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl fmt::Display for LocationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{}", id),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

// ── Image ───────────────────────────────────────────────────────────────────

/// An image stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub location: i64,
    /// Path relative to the owning location's root.
    pub path: PathBuf,
    pub name: String,
    pub extension: String,
    pub creator: Option<String>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub alt: Option<String>,
    pub rating: Option<i64>,
    pub hash: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub creation_date: Option<i64>,
    pub last_modified: Option<i64>,
    /// Opaque embedded-metadata blob (JSON text).
    pub exif: Option<String>,
}

/// An image row staged for insertion, derived from a file on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImage {
    pub location: i64,
    pub path: String,
    pub name: String,
    pub extension: String,
    pub hash: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub creator: Option<String>,
    pub creation_date: i64,
    pub last_modified: i64,
    pub exif: String,
}

/// User-editable image fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ImageEdit {
    pub creator: Option<Option<String>>,
    pub title: Option<Option<String>>,
    pub caption: Option<Option<String>>,
    pub alt: Option<Option<String>>,
    pub rating: Option<Option<i64>>,
}

impl ImageEdit {
    pub fn is_empty(&self) -> bool {
        self.creator.is_none()
            && self.title.is_none()
            && self.caption.is_none()
            && self.alt.is_none()
            && self.rating.is_none()
    }
}

// ── Task ────────────────────────────────────────────────────────────────────

/// The JSON configuration stored alongside each task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfiguration {
    /// Serialized path pattern applied below the source root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Destination path format, relative to the destination root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Extension allow-list overriding `files.formats`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<String>>,
}

/// A named, repeatable import job.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub name: String,
    pub description: Option<String>,
    pub source: i64,
    pub destination: i64,
    pub configuration: TaskConfiguration,
    pub last_ran: Option<DateTime<Local>>,
}

/// Fields for defining a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub source: Option<LocationRef>,
    pub destination: Option<LocationRef>,
    pub configuration: TaskConfiguration,
}

/// Normalize an extension allow-list to lower-case, dot-prefixed entries.
pub fn normalize_formats<I, S>(formats: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = formats
        .into_iter()
        .map(|f| {
            let f = f.as_ref().trim().to_lowercase();
            if f.starts_with('.') { f } else { format!(".{}", f) }
        })
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}
