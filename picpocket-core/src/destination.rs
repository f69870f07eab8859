//! Destination path formats for task runs.
//!
//! A format is a relative path template such as
//! `{date:%Y}/{date:%m}/{name}-{index}.{extension}`. Literal braces are
//! written doubled (`{{`, `}}`).
//!
//! `{index}` counts every file of an allowed format a run visits, in walk
//! order. Files that are skipped or fail still use up their number.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};

use crate::error::FormatError;

/// `{date}` without an argument.
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Path relative to the source root
    Path,
    /// Parent directory of `Path`, empty at the top level
    Directory,
    File,
    Name,
    /// Extension without the leading dot
    Extension,
    /// 1-based position among the run's files of an allowed format,
    /// counting files that are skipped or fail
    Index,
    /// SHA-256 of the file contents
    Hash,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "path" => Self::Path,
            "directory" => Self::Directory,
            "file" => Self::File,
            "name" => Self::Name,
            "extension" => Self::Extension,
            "index" => Self::Index,
            "hash" => Self::Hash,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Field),
    /// File modification time rendered with a strftime format
    Date(String),
}

/// Values for one file being placed into a destination.
#[derive(Debug, Clone)]
pub struct DestinationContext<'a> {
    /// Source file path relative to the source root.
    pub source: &'a Path,
    pub index: usize,
    pub hash: Option<&'a str>,
    pub modified: Option<DateTime<Local>>,
}

/// A parsed destination path format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationFormat {
    raw: String,
    segments: Vec<Segment>,
}

impl DestinationFormat {
    pub fn parse(raw: &str) -> Result<Self, FormatError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    text.push('}');
                }
                '{' => {
                    let mut inner = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => inner.push(ch),
                            None => return Err(FormatError::Unclosed(raw.to_string())),
                        }
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(parse_placeholder(&inner)?);
                }
                '}' => return Err(FormatError::Unmatched(raw.to_string())),
                _ => text.push(c),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether rendering needs the file's content hash.
    pub fn needs_hash(&self) -> bool {
        self.segments.contains(&Segment::Field(Field::Hash))
    }

    /// Whether rendering needs the file's modification time.
    pub fn needs_date(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Date(_)))
    }

    /// Destination path, relative to the destination root.
    pub fn render(&self, context: &DestinationContext<'_>) -> Result<PathBuf, FormatError> {
        let source = context.source;
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(field) => match field {
                    Field::Path => out.push_str(&slash_path(source)),
                    Field::Directory => {
                        out.push_str(&source.parent().map(slash_path).unwrap_or_default())
                    }
                    Field::File => out.push_str(&lossy(source.file_name())),
                    Field::Name => out.push_str(&lossy(source.file_stem())),
                    Field::Extension => out.push_str(&lossy(source.extension())),
                    Field::Index => out.push_str(&context.index.to_string()),
                    Field::Hash => {
                        out.push_str(context.hash.ok_or(FormatError::MissingValue("hash"))?)
                    }
                },
                Segment::Date(format) => {
                    let modified = context.modified.ok_or(FormatError::MissingValue("date"))?;
                    write!(out, "{}", modified.format(format))
                        .map_err(|_| FormatError::InvalidDateFormat(format.clone()))?;
                }
            }
        }

        // Empty segments collapse, so `{directory}/{file}` works at the top level.
        let parts: Vec<&str> = out
            .split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .collect();
        if parts.is_empty() || parts.contains(&"..") {
            return Err(FormatError::Escapes(out));
        }
        Ok(parts.iter().collect())
    }
}

fn parse_placeholder(inner: &str) -> Result<Segment, FormatError> {
    let (name, argument) = match inner.split_once(':') {
        Some((name, argument)) => (name, Some(argument)),
        None => (inner, None),
    };
    if name == "date" {
        let format = argument.unwrap_or(DEFAULT_DATE_FORMAT);
        if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(FormatError::InvalidDateFormat(format.to_string()));
        }
        return Ok(Segment::Date(format.to_string()));
    }
    match (Field::from_name(name), argument) {
        (Some(field), None) => Ok(Segment::Field(field)),
        _ => Err(FormatError::UnknownPlaceholder(inner.to_string())),
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn lossy(part: Option<&std::ffi::OsStr>) -> String {
    part.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default()
}

impl FromStr for DestinationFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DestinationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
#[path = "tests/destination_tests.rs"]
mod tests;
