use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use picpocket_core::{Location, LocationEdit, LocationRef, NewLocation};
use picpocket_import::{LocationImportOptions, LogProgress, import_location};

use crate::CliError;

use super::open_store;

pub(crate) fn run_add(directory: &Path, location: NewLocation) -> Result<(), CliError> {
    let mut store = open_store(directory)?;
    let id = store.add_location(&location)?;
    log::info!(
        "{} Added location {} (#{})",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        location.name.if_supports_color(Stdout, |t| t.bold()),
        id
    );
    Ok(())
}

pub(crate) fn run_list(directory: &Path) -> Result<(), CliError> {
    let mut store = open_store(directory)?;
    let locations = store.list_locations()?;
    if locations.is_empty() {
        log::info!("No locations. Add one with 'picpocket location add'.");
        return Ok(());
    }

    for location in &locations {
        let images = store.count_images(Some(location.id))?;
        log::info!(
            "{} {} [{}]",
            format!("#{}", location.id).if_supports_color(Stdout, |t| t.dimmed()),
            location.name.if_supports_color(Stdout, |t| t.bold()),
            roles(location).if_supports_color(Stdout, |t| t.cyan()),
        );
        match &location.path {
            Some(path) => log::info!("    Path: {}", path.display()),
            None => log::info!("    Path: (none)"),
        }
        if let Some(description) = &location.description {
            log::info!("    {}", description);
        }
        log::info!("    Images: {}", images);
    }
    Ok(())
}

pub(crate) fn run_edit(directory: &Path, target: &str, edit: LocationEdit) -> Result<(), CliError> {
    if edit.is_empty() {
        return Err(CliError::invalid_argument("nothing to change"));
    }
    let mut store = open_store(directory)?;
    store.edit_location(&LocationRef::parse(target), &edit)?;
    log::info!("Updated location {}", target);
    Ok(())
}

pub(crate) fn run_remove(directory: &Path, target: &str, force: bool) -> Result<(), CliError> {
    let mut store = open_store(directory)?;
    if store.remove_location(&LocationRef::parse(target), force)? {
        log::info!("Removed location {}", target);
    } else {
        log::warn!("No location named {}", target);
    }
    Ok(())
}

pub(crate) fn run_import(
    directory: &Path,
    target: &str,
    mount: Option<PathBuf>,
    options: LocationImportOptions,
) -> Result<(), CliError> {
    let mut store = open_store(directory)?;
    let location = LocationRef::parse(target);
    if let Some(mount) = mount {
        store.mount(&location, mount)?;
    }

    let result = import_location(&mut store, &location, &options, &LogProgress)?;
    if result.stats.errors > 0 {
        log::warn!(
            "{} {} files could not be imported",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            result.stats.errors
        );
    }
    Ok(())
}

fn roles(location: &Location) -> String {
    let mut roles = Vec::new();
    if location.source {
        roles.push("source");
    }
    if location.destination {
        roles.push("destination");
    }
    if location.removable {
        roles.push("removable");
    }
    roles.join(", ")
}
