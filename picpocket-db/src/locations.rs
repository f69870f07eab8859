//! Location CRUD and session mounts.

use std::path::{Path, PathBuf};

use picpocket_core::{Location, LocationEdit, LocationRef, NewLocation};
use rusqlite::Row;
use rusqlite::types::Value;

use crate::error::DbError;
use crate::store::{Cursor, Store};
use crate::tables::{self, Bindings};

const LOCATION_COLUMNS: &[&str] = &[
    "id",
    "name",
    "description",
    "path",
    "source",
    "destination",
    "removable",
];

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        path: row.get::<_, Option<String>>(3)?.map(PathBuf::from),
        source: row.get(4)?,
        destination: row.get(5)?,
        removable: row.get(6)?,
        mount_point: None,
    })
}

/// Key column and value addressing `location`.
fn location_key(location: &LocationRef) -> (&'static str, Value) {
    match location {
        LocationRef::Id(id) => ("id", Value::Integer(*id)),
        LocationRef::Name(name) => ("name", Value::Text(name.clone())),
    }
}

fn absolute_directory(path: &Path) -> Result<String, DbError> {
    if !path.is_dir() {
        return Err(DbError::invalid(format!(
            "Supplied path ({}) is not a directory",
            path.display()
        )));
    }
    Ok(std::path::absolute(path)?.to_string_lossy().into_owned())
}

impl Cursor<'_> {
    pub fn insert_location(&self, location: &NewLocation) -> Result<i64, DbError> {
        if location.name.trim().is_empty() {
            return Err(DbError::invalid("A location needs a name"));
        }
        if !(location.source || location.destination) {
            return Err(DbError::invalid(
                "A location must be a source, destination, or both",
            ));
        }
        if location.path.is_none() && !location.removable {
            return Err(DbError::invalid(
                "Non-removable storage must have a supplied path",
            ));
        }

        let mut bindings = Bindings::new()
            .set("name", location.name.clone())
            .set("source", location.source)
            .set("destination", location.destination)
            .set("removable", location.removable);
        if let Some(path) = &location.path {
            bindings.push("path", absolute_directory(path)?);
        }
        if let Some(description) = &location.description {
            bindings.push("description", description.clone());
        }

        let sql = format!(
            "{} RETURNING {}",
            tables::insert(self.dialect(), &self.tables().locations, &bindings.columns())?,
            self.dialect().identifier("id")?,
        );
        self.query_row(&sql, &bindings, |row| row.get(0))?
            .ok_or_else(|| DbError::invalid(format!("Failed to add location {}", location.name)))
    }

    pub fn location(&self, location: &LocationRef) -> Result<Option<Location>, DbError> {
        let (key, value) = location_key(location);
        let sql = tables::select(
            self.dialect(),
            &self.tables().locations,
            LOCATION_COLUMNS,
            Some(key),
        )?;
        self.query_row(&sql, &Bindings::new().set(key, value), location_from_row)
    }

    /// Like [`Cursor::location`], but a missing location is an error.
    pub fn expect_location(&self, location: &LocationRef) -> Result<Location, DbError> {
        self.location(location)?
            .ok_or_else(|| DbError::not_found("location", location))
    }

    pub fn locations(&self) -> Result<Vec<Location>, DbError> {
        let sql = format!(
            "{} ORDER BY {}",
            tables::select(self.dialect(), &self.tables().locations, LOCATION_COLUMNS, None)?,
            self.dialect().identifier("id")?,
        );
        self.query_map(&sql, &Bindings::new(), location_from_row)
    }

    pub fn update_location(&self, location: &LocationRef, edit: &LocationEdit) -> Result<(), DbError> {
        let mut bindings = Bindings::new();
        if let Some(name) = &edit.name {
            bindings.push("name", name.clone());
        }
        if let Some(path) = &edit.path {
            let path = path.as_deref().map(absolute_directory).transpose()?;
            bindings.push("path", path);
        }
        if let Some(description) = &edit.description {
            bindings.push("description", description.clone());
        }
        if let Some(source) = edit.source {
            bindings.push("source", source);
        }
        if let Some(destination) = edit.destination {
            bindings.push("destination", destination);
        }
        if let Some(removable) = edit.removable {
            bindings.push("removable", removable);
        }
        if bindings.is_empty() {
            return Err(DbError::invalid(format!(
                "No edits made to location {}",
                location
            )));
        }

        let current = self.expect_location(location)?;
        let source = edit.source.unwrap_or(current.source);
        let destination = edit.destination.unwrap_or(current.destination);
        if !(source || destination) {
            return Err(DbError::invalid(
                "A location must be a source, destination, or both",
            ));
        }
        let has_path = match &edit.path {
            Some(path) => path.is_some(),
            None => current.path.is_some(),
        };
        if !has_path && !edit.removable.unwrap_or(current.removable) {
            return Err(DbError::invalid(
                "Non-removable storage must have a supplied path",
            ));
        }

        let sql = tables::update(self.dialect(), &self.tables().locations, &bindings.columns(), "id")?;
        bindings.push("id", current.id);
        self.execute(&sql, &bindings)?;
        Ok(())
    }

    /// Delete a location. Images stored there block removal unless `force`,
    /// in which case they are deleted with it.
    pub fn delete_location(&self, location: &LocationRef, force: bool) -> Result<bool, DbError> {
        let Some(current) = self.location(location)? else {
            return Ok(false);
        };

        let images = self.image_count(Some(current.id))?;
        if images > 0 {
            if force {
                log::warn!("Deleting {} images in location {}", images, current.name);
            } else {
                return Err(DbError::DataIntegrity(format!(
                    "Cannot delete location ({}). {} images are associated with the location.",
                    location, images
                )));
            }
        }

        let sql = tables::delete(self.dialect(), &self.tables().locations, "id")?;
        let deleted = self.execute(&sql, &Bindings::new().set("id", current.id))?;
        Ok(deleted > 0)
    }
}

impl Store {
    /// Register a location and return its id.
    pub fn add_location(&mut self, location: &NewLocation) -> Result<i64, DbError> {
        self.with_cursor(true, |cursor| cursor.insert_location(location))
    }

    pub fn get_location(&mut self, location: &LocationRef) -> Result<Option<Location>, DbError> {
        let found = self.with_cursor(false, |cursor| cursor.location(location))?;
        Ok(found.map(|location| self.with_mount(location)))
    }

    pub fn list_locations(&mut self) -> Result<Vec<Location>, DbError> {
        let locations = self.with_cursor(false, |cursor| cursor.locations())?;
        Ok(locations
            .into_iter()
            .map(|location| self.with_mount(location))
            .collect())
    }

    pub fn edit_location(&mut self, location: &LocationRef, edit: &LocationEdit) -> Result<(), DbError> {
        self.with_cursor(true, |cursor| cursor.update_location(location, edit))
    }

    /// Remove a location, returning whether it existed.
    pub fn remove_location(&mut self, location: &LocationRef, force: bool) -> Result<bool, DbError> {
        let id = self.get_location(location)?.map(|l| l.id);
        let removed = self.with_cursor(true, |cursor| cursor.delete_location(location, force))?;
        if let Some(id) = id {
            self.mounts.remove(&id);
        }
        Ok(removed)
    }

    /// Use `path` as the location's root for the rest of this session.
    pub fn mount(&mut self, location: &LocationRef, path: impl AsRef<Path>) -> Result<(), DbError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(DbError::invalid(format!(
                "No directory named {}",
                path.display()
            )));
        }
        let id = self
            .with_cursor(false, |cursor| cursor.expect_location(location))?
            .id;
        self.mounts.insert(id, std::path::absolute(path)?);
        Ok(())
    }

    pub fn unmount(&mut self, location: &LocationRef) -> Result<(), DbError> {
        let id = self
            .with_cursor(false, |cursor| cursor.expect_location(location))?
            .id;
        self.mounts.remove(&id);
        Ok(())
    }

    fn with_mount(&self, mut location: Location) -> Location {
        location.mount_point = self.mounts.get(&location.id).cloned();
        location
    }
}
