use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while parsing a serialized path pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The `{name}` is not a known path part
    #[error("Unsupported dynamic path: {0}")]
    UnknownPart(String),

    /// `date`, `regex` and `str` need an argument
    #[error("Path part '{name}' requires an argument: {segment}")]
    MissingArgument { name: String, segment: String },

    /// `year`, `month` and `day` take none
    #[error("Path part '{name}' takes no argument: {segment}")]
    UnexpectedArgument { name: String, segment: String },

    #[error("Invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),
}

/// Errors raised while loading or validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A required key is absent or has the wrong type
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Credentials were requested but no prompt is available
    #[error("Cannot prompt for credentials")]
    NoPrompt,
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Errors raised by destination path formats.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Unknown destination placeholder: {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("Unclosed '{{' in destination format: {0}")]
    Unclosed(String),

    #[error("Unmatched '}}' in destination format: {0}")]
    Unmatched(String),

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    /// The format needs a value the caller did not supply
    #[error("No value for destination placeholder: {{{0}}}")]
    MissingValue(&'static str),

    /// The rendered path would leave the destination root
    #[error("Destination path escapes its location: {0}")]
    Escapes(String),
}
