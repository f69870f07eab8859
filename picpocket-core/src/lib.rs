//! Core types for PicPocket: the catalog data model, versions, configuration
//! and the path patterns that drive incremental task runs.

pub mod config;
pub mod destination;
pub mod error;
pub mod pattern;
pub mod types;
pub mod version;

pub use config::{ConfigContents, Configuration, default_directory};
pub use destination::{DestinationContext, DestinationFormat};
pub use error::{ConfigError, FormatError, PatternError};
pub use pattern::{MatchParams, ParamValue, Params, PathPart, PathPattern};
pub use types::*;
pub use version::Version;
