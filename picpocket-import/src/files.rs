//! Reading image files: hashes, dimensions, timestamps and the catalog row
//! built from them.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Local};
use picpocket_core::NewImage;
use sha2::{Digest, Sha256};

use crate::error::ImportError;

const CHUNK_SIZE: usize = 64 * 1024;

/// Hex SHA-256 of the file contents.
pub fn hash_file(path: &Path) -> Result<String, ImportError> {
    let mut file = File::open(path).map_err(|e| ImportError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(|e| ImportError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}

/// Pixel dimensions, when the `image` crate can read the header.
pub fn dimensions(path: &Path) -> Option<(u32, u32)> {
    match image::image_dimensions(path) {
        Ok(dimensions) => Some(dimensions),
        Err(e) => {
            log::debug!("No dimensions for {}: {}", path.display(), e);
            None
        }
    }
}

/// Last modification time of `path`.
pub fn modified(path: &Path) -> Result<DateTime<Local>, ImportError> {
    let modified = std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|e| ImportError::io(path, e))?;
    Ok(DateTime::<Local>::from(modified))
}

/// Whether the file's extension is in `formats` (lower-case, dot-prefixed).
pub fn has_allowed_extension(path: &Path, formats: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .is_some_and(|ext| formats.contains(&ext))
}

/// Build the catalog row for `path`, a file under the location root `root`.
pub fn image_row(
    location: i64,
    root: &Path,
    path: &Path,
    creator: Option<&str>,
) -> Result<NewImage, ImportError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ImportError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;
    let metadata = std::fs::metadata(path).map_err(|e| ImportError::io(path, e))?;
    if !metadata.is_file() {
        return Err(ImportError::NotAFile(path.to_path_buf()));
    }

    let last_modified = metadata
        .modified()
        .map(|time| DateTime::<Local>::from(time).timestamp())
        .map_err(|e| ImportError::io(path, e))?;
    let creation_date = metadata
        .created()
        .map(|time| DateTime::<Local>::from(time).timestamp())
        .unwrap_or(last_modified);
    let (width, height) = dimensions(path).unzip();

    let format = image::ImageFormat::from_path(path)
        .ok()
        .map(|format| format!("{:?}", format));
    let exif = serde_json::json!({
        "format": format,
        "size": metadata.len(),
    });

    Ok(NewImage {
        location,
        path: relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        name: path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
        extension: path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
        hash: hash_file(path)?,
        width,
        height,
        creator: creator.map(str::to_string),
        creation_date,
        last_modified,
        exif: exif.to_string(),
    })
}

#[cfg(test)]
#[path = "tests/files_tests.rs"]
mod tests;
