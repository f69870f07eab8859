//! The PicPocket configuration file (`picpocket-config.toml`).
//!
//! The file lives in the PicPocket directory and names the storage backend,
//! its connection parameters and the file formats imports consider:
//!
//! ```toml
//! [backend]
//! type = "sqlite"
//!
//! [backend.connection]
//! path = "picpocket.sqlite3"
//!
//! [files]
//! formats = [".jpg", ".png"]
//! ```
//!
//! Contents are loaded lazily and cached until [`Configuration::reload`].
//! Credentials come from an injected prompt, evaluated at most once per load.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "picpocket-config.toml";

/// Environment variable overriding the default PicPocket directory.
pub const DIRECTORY_ENV: &str = "PICPOCKET_DIR";

/// Extensions imported when the configuration does not list any.
pub const DEFAULT_FORMATS: &[&str] = &[
    ".bmp", ".gif", ".heic", ".jpeg", ".jpg", ".mp4", ".orf", ".png",
];

/// Default PicPocket directory: `$PICPOCKET_DIR`, else `~/.config/picpocket`.
pub fn default_directory() -> PathBuf {
    if let Some(dir) = std::env::var_os(DIRECTORY_ENV) {
        return PathBuf::from(dir);
    }
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("picpocket")
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigContents {
    pub backend: BackendConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend discriminant, e.g. `"sqlite"`.
    #[serde(rename = "type")]
    pub backend_type: String,
    /// Backend-specific connection parameters, validated by the backend.
    #[serde(default)]
    pub connection: toml::Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
        }
    }
}

fn default_formats() -> Vec<String> {
    DEFAULT_FORMATS.iter().map(|f| f.to_string()).collect()
}

impl ConfigContents {
    pub fn new(backend_type: &str, connection: toml::Table) -> Self {
        Self {
            backend: BackendConfig {
                backend_type: backend_type.to_string(),
                connection,
            },
            files: FilesConfig::default(),
        }
    }
}

/// Produces a credential on demand (e.g. a password prompt).
pub type Prompt = Box<dyn Fn() -> Option<String>>;

/// Cached credential state for one configuration load.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CredentialCache {
    Uncached,
    Cached(Option<String>),
}

/// Handle on the configuration file in a PicPocket directory.
pub struct Configuration {
    directory: PathBuf,
    file: PathBuf,
    contents: Option<ConfigContents>,
    credentials: CredentialCache,
    prompt: Option<Prompt>,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("directory", &self.directory)
            .field("contents", &self.contents)
            .field("cached_credentials", &(self.credentials != CredentialCache::Uncached))
            .field("prompt", &self.prompt.is_some())
            .finish()
    }
}

impl Configuration {
    /// Refer to the configuration in `directory`. Nothing is read yet.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        let file = directory.join(CONFIG_FILE);
        Self {
            directory,
            file,
            contents: None,
            credentials: CredentialCache::Uncached,
            prompt: None,
        }
    }

    /// Attach the capability used to ask for credentials.
    pub fn with_prompt(mut self, prompt: impl Fn() -> Option<String> + 'static) -> Self {
        self.prompt = Some(Box::new(prompt));
        self
    }

    /// Write `contents` to a new configuration file in `directory`.
    pub fn create(directory: impl Into<PathBuf>, contents: &ConfigContents) -> Result<Self, ConfigError> {
        let mut configuration = Self::new(directory);
        configuration.save(contents)?;
        Ok(configuration)
    }

    /// Overwrite the file with `contents` and use them from now on.
    pub fn save(&mut self, contents: &ConfigContents) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.directory).map_err(|source| ConfigError::Io {
            path: self.directory.clone(),
            source,
        })?;
        let serialized = toml::to_string_pretty(contents)?;
        std::fs::write(&self.file, serialized).map_err(|source| ConfigError::Io {
            path: self.file.clone(),
            source,
        })?;
        self.contents = Some(contents.clone());
        self.credentials = CredentialCache::Uncached;
        Ok(())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn exists(&self) -> bool {
        self.file.is_file()
    }

    /// The file's contents, read on first access.
    pub fn contents(&mut self) -> Result<&ConfigContents, ConfigError> {
        if self.contents.is_none() {
            self.reload()?;
        }
        self.contents
            .as_ref()
            .ok_or_else(|| ConfigError::invalid("configuration not loaded"))
    }

    /// The configured backend discriminant.
    pub fn backend_type(&mut self) -> Result<String, ConfigError> {
        Ok(self.contents()?.backend.backend_type.clone())
    }

    /// Credentials for the backend, prompting at most once per load.
    pub fn credentials(&mut self) -> Result<Option<String>, ConfigError> {
        if let CredentialCache::Cached(credentials) = &self.credentials {
            return Ok(credentials.clone());
        }
        let prompt = self.prompt.as_ref().ok_or(ConfigError::NoPrompt)?;
        let credentials = prompt();
        self.credentials = CredentialCache::Cached(credentials.clone());
        Ok(credentials)
    }

    /// Re-read the file and forget cached credentials.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        log::debug!("Loading configuration from {}", self.file.display());
        let text = std::fs::read_to_string(&self.file).map_err(|source| ConfigError::Io {
            path: self.file.clone(),
            source,
        })?;
        let contents: ConfigContents = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.file.clone(),
            source,
        })?;
        self.contents = Some(contents);
        self.credentials = CredentialCache::Uncached;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
