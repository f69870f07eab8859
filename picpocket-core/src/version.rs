//! Version numbers for the package and the database schemas.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A semver-ish version with an optional pre-release label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub label: Option<String>,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32, label: Option<&str>) -> Self {
        Self {
            major,
            minor,
            patch,
            label: label.map(str::to_string),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(label) = &self.label {
            write!(f, "-{}", label)?;
        }
        Ok(())
    }
}

/// Version of the package and its frontend API.
pub fn package_version() -> Version {
    Version::new(0, 1, 0, Some("dev"))
}

/// Schema version the SQLite backend writes and expects.
pub fn sqlite_version() -> Version {
    Version::new(0, 1, 0, Some("dev"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_and_without_label() {
        assert_eq!(Version::new(1, 2, 3, None).to_string(), "1.2.3");
        assert_eq!(Version::new(0, 1, 0, Some("dev")).to_string(), "0.1.0-dev");
    }

    #[test]
    fn label_participates_in_equality() {
        assert_ne!(
            Version::new(0, 1, 0, Some("dev")),
            Version::new(0, 1, 0, Some("dev-1"))
        );
        assert_ne!(Version::new(0, 1, 0, Some("dev")), Version::new(0, 1, 0, None));
    }
}
