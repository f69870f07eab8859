//! Image rows: batch upserts from the importer and user edits.

use std::path::PathBuf;

use picpocket_core::{Image, ImageEdit, NewImage};
use rusqlite::Row;

use crate::error::DbError;
use crate::store::{Cursor, Store};
use crate::tables::{self, Bindings};

const IMAGE_COLUMNS: &[&str] = &[
    "id",
    "location",
    "path",
    "name",
    "extension",
    "creator",
    "title",
    "caption",
    "alt",
    "rating",
    "hash",
    "width",
    "height",
    "creation_date",
    "last_modified",
    "exif",
];

/// Columns derived from the file itself, refreshed on every re-import.
const FILE_COLUMNS: &[&str] = &[
    "name",
    "extension",
    "width",
    "height",
    "hash",
    "creation_date",
    "last_modified",
    "exif",
];

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<Image> {
    Ok(Image {
        id: row.get(0)?,
        location: row.get(1)?,
        path: PathBuf::from(row.get::<_, String>(2)?),
        name: row.get(3)?,
        extension: row.get(4)?,
        creator: row.get(5)?,
        title: row.get(6)?,
        caption: row.get(7)?,
        alt: row.get(8)?,
        rating: row.get(9)?,
        hash: row.get(10)?,
        width: row.get(11)?,
        height: row.get(12)?,
        creation_date: row.get(13)?,
        last_modified: row.get(14)?,
        exif: row.get(15)?,
    })
}

fn new_image_bindings(image: &NewImage) -> Bindings {
    Bindings::new()
        .set("location", image.location)
        .set("path", image.path.clone())
        .set("name", image.name.clone())
        .set("extension", image.extension.clone())
        .set("hash", image.hash.clone())
        .set("width", image.width)
        .set("height", image.height)
        .set("creator", image.creator.clone())
        .set("creation_date", image.creation_date)
        .set("last_modified", image.last_modified)
        .set("exif", image.exif.clone())
}

impl Cursor<'_> {
    /// `INSERT ... ON CONFLICT (location, path) DO UPDATE ... RETURNING id`.
    /// File-derived columns are overwritten; a creator already set is kept.
    fn image_upsert(&self, columns: &[&str]) -> Result<String, DbError> {
        let dialect = self.dialect();
        let table = &self.tables().images;
        let mut assignments = Vec::with_capacity(FILE_COLUMNS.len() + 1);
        for column in FILE_COLUMNS {
            assignments.push(format!(
                "{} = {}",
                dialect.identifier(column)?,
                dialect.identifier(&format!("excluded.{}", column))?,
            ));
        }
        assignments.push(format!(
            "{} = COALESCE({}, {})",
            dialect.identifier("creator")?,
            dialect.identifier("images.creator")?,
            dialect.identifier("excluded.creator")?,
        ));

        Ok(format!(
            "{} ON CONFLICT ({}) DO UPDATE SET {} RETURNING {}",
            tables::insert(dialect, table, columns)?,
            dialect.identifiers(&["location", "path"])?,
            assignments.join(", "),
            dialect.identifier("id")?,
        ))
    }

    /// Insert or refresh each image, returning ids in input order.
    pub fn upsert_images(&self, images: &[NewImage]) -> Result<Vec<i64>, DbError> {
        let Some(first) = images.first() else {
            return Ok(Vec::new());
        };
        let sql = self.image_upsert(&new_image_bindings(first).columns())?;

        let mut ids = Vec::with_capacity(images.len());
        for image in images {
            let id = self
                .query_row(&sql, &new_image_bindings(image), |row| row.get(0))?
                .ok_or_else(|| DbError::invalid(format!("Failed to import {}", image.path)))?;
            ids.push(id);
        }
        Ok(ids)
    }

    pub fn image(&self, id: i64) -> Result<Option<Image>, DbError> {
        let sql = tables::select(self.dialect(), &self.tables().images, IMAGE_COLUMNS, Some("id"))?;
        self.query_row(&sql, &Bindings::new().set("id", id), image_from_row)
    }

    pub fn image_at(&self, location: i64, path: &str) -> Result<Option<Image>, DbError> {
        let dialect = self.dialect();
        let table = &self.tables().images;
        let sql = format!(
            "{} AND {}",
            tables::select(dialect, table, IMAGE_COLUMNS, Some("location"))?,
            tables::where_equal(dialect, table, "path")?,
        );
        let bindings = Bindings::new()
            .set("location", location)
            .set("path", path.to_string());
        self.query_row(&sql, &bindings, image_from_row)
    }

    pub fn image_count(&self, location: Option<i64>) -> Result<i64, DbError> {
        let dialect = self.dialect();
        let table = &self.tables().images;
        let mut sql = format!(
            "SELECT COUNT({}) FROM {}",
            dialect.identifier("id")?,
            dialect.identifier(table.name)?,
        );
        let mut bindings = Bindings::new();
        if let Some(location) = location {
            sql.push_str(&format!(" WHERE {}", tables::where_equal(dialect, table, "location")?));
            bindings.push("location", location);
        }
        Ok(self.query_row(&sql, &bindings, |row| row.get(0))?.unwrap_or(0))
    }

    pub fn update_image(&self, id: i64, edit: &ImageEdit) -> Result<(), DbError> {
        let mut bindings = Bindings::new();
        if let Some(creator) = &edit.creator {
            bindings.push("creator", creator.clone());
        }
        if let Some(title) = &edit.title {
            bindings.push("title", title.clone());
        }
        if let Some(caption) = &edit.caption {
            bindings.push("caption", caption.clone());
        }
        if let Some(alt) = &edit.alt {
            bindings.push("alt", alt.clone());
        }
        if let Some(rating) = edit.rating {
            bindings.push("rating", rating);
        }
        if bindings.is_empty() {
            return Err(DbError::invalid(format!("No edits made to image {}", id)));
        }

        let sql = tables::update(self.dialect(), &self.tables().images, &bindings.columns(), "id")?;
        bindings.push("id", id);
        if self.execute(&sql, &bindings)? == 0 {
            return Err(DbError::not_found("image", id));
        }
        Ok(())
    }

    pub fn delete_image(&self, id: i64) -> Result<bool, DbError> {
        let sql = tables::delete(self.dialect(), &self.tables().images, "id")?;
        Ok(self.execute(&sql, &Bindings::new().set("id", id))? > 0)
    }
}

impl Store {
    /// Upsert a batch of images in one transaction.
    pub fn insert_images(&mut self, images: &[NewImage]) -> Result<Vec<i64>, DbError> {
        self.with_cursor(true, |cursor| cursor.upsert_images(images))
    }

    pub fn get_image(&mut self, id: i64) -> Result<Option<Image>, DbError> {
        self.with_cursor(false, |cursor| cursor.image(id))
    }

    /// Look an image up by location and path relative to the location root.
    pub fn find_image(&mut self, location: i64, path: &str) -> Result<Option<Image>, DbError> {
        self.with_cursor(false, |cursor| cursor.image_at(location, path))
    }

    /// Number of images, optionally restricted to one location.
    pub fn count_images(&mut self, location: Option<i64>) -> Result<i64, DbError> {
        self.with_cursor(false, |cursor| cursor.image_count(location))
    }

    pub fn edit_image(&mut self, id: i64, edit: &ImageEdit) -> Result<(), DbError> {
        self.with_cursor(true, |cursor| cursor.update_image(id, edit))
    }

    /// Remove an image row. The file on disk is left alone.
    pub fn remove_image(&mut self, id: i64) -> Result<bool, DbError> {
        self.with_cursor(true, |cursor| cursor.delete_image(id))
    }
}
