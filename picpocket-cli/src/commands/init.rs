use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use picpocket_core::{ConfigContents, Configuration, normalize_formats};
use picpocket_db::Store;

use crate::CliError;

/// Write a configuration file for `backend` and create its catalog.
pub(crate) fn run_init(
    directory: &Path,
    backend: &str,
    path: Option<String>,
    formats: Option<Vec<String>>,
) -> Result<(), CliError> {
    let existing = Configuration::new(directory);
    if existing.exists() {
        return Err(CliError::invalid_argument(format!(
            "{} already exists",
            existing.file().display()
        )));
    }

    let mut connection = toml::Table::new();
    if let Some(path) = path {
        connection.insert("path".to_string(), toml::Value::String(path));
    }
    // Reject bad connection settings before anything is written.
    let connection = picpocket_db::backend(backend)?.parse_connection_info(&connection)?;

    let mut contents = ConfigContents::new(backend, connection);
    if let Some(formats) = formats {
        if formats.is_empty() {
            return Err(CliError::invalid_argument("--formats needs at least one extension"));
        }
        contents.files.formats = normalize_formats(&formats);
    }

    let configuration = Configuration::create(directory, &contents)?;
    log::debug!("Wrote {}", configuration.file().display());
    let mut store = Store::load(configuration)?;
    store.initialize()?;

    log::info!(
        "{} Initialized PicPocket in {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        directory.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    Ok(())
}
