pub(crate) mod init;
pub(crate) mod location;
pub(crate) mod task;
pub(crate) mod version;

use std::path::Path;

use picpocket_core::Configuration;
use picpocket_db::Store;

use crate::CliError;

/// Open the catalog configured in `directory`, warning when its schema
/// version is not the one this build expects.
pub(crate) fn open_store(directory: &Path) -> Result<Store, CliError> {
    let configuration = Configuration::new(directory);
    if !configuration.exists() {
        return Err(CliError::NotInitialized(directory.display().to_string()));
    }
    let mut store = Store::load(configuration)?;
    store.connect(Some(true))?;
    if !store.matching_version() {
        log::warn!(
            "Catalog version does not match this build ({}); results may be unreliable",
            store.api_version()
        );
    }
    Ok(store)
}
