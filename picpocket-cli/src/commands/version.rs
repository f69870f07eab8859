use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::CliError;

use super::open_store;

/// Print the program version and, when a catalog exists, its version.
pub(crate) fn run_version(directory: &Path) -> Result<(), CliError> {
    log::info!("PicPocket {}", picpocket_core::version::package_version());

    let mut store = match open_store(directory) {
        Ok(store) => store,
        Err(CliError::NotInitialized(_)) => {
            log::info!(
                "  Catalog: {}",
                "not initialized".if_supports_color(Stdout, |t| t.dimmed())
            );
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let expected = store.api_version();
    let found = store.get_version()?;
    let status = if found == expected {
        format!("{}", "(current)".if_supports_color(Stdout, |t| t.green()))
    } else {
        format!(
            "{}",
            format!("(expected {})", expected).if_supports_color(Stdout, |t| t.red())
        )
    };
    log::info!(
        "  Catalog: {} {} {}",
        store.backend().name(),
        found,
        status
    );
    Ok(())
}
