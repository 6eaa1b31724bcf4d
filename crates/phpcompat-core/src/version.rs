//! PHP version values
//!
//! Versions are `major[.minor[.patch]]`, compared numerically component by
//! component with missing components treated as 0.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// A PHP version such as `5.4` or `5.5.1`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhpVersion {
    major: u32,
    minor: Option<u32>,
    patch: Option<u32>,
}

impl PhpVersion {
    /// Create a `major.minor` version
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor: Some(minor),
            patch: None,
        }
    }

    /// Create a `major.minor.patch` version
    pub const fn with_patch(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor: Some(minor),
            patch: Some(patch),
        }
    }

    pub fn minor(&self) -> u32 {
        self.minor.unwrap_or(0)
    }

    pub fn patch(&self) -> u32 {
        self.patch.unwrap_or(0)
    }

    fn components(&self) -> (u32, u32, u32) {
        (self.major, self.minor(), self.patch())
    }
}

impl PartialEq for PhpVersion {
    fn eq(&self, other: &Self) -> bool {
        self.components() == other.components()
    }
}

impl Eq for PhpVersion {}

impl PartialOrd for PhpVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PhpVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components().cmp(&other.components())
    }
}

impl std::fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{}", minor)?;
        }
        if let Some(patch) = self.patch {
            write!(f, ".{}", patch)?;
        }
        Ok(())
    }
}

impl FromStr for PhpVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let mut parts = trimmed.split('.');
        let major = parse_component(trimmed, parts.next())?;
        let minor = parts.next().map(|p| parse_component(trimmed, Some(p))).transpose()?;
        let patch = parts.next().map(|p| parse_component(trimmed, Some(p))).transpose()?;

        if parts.next().is_some() {
            return Err(VersionError::TooManyComponents(trimmed.to_string()));
        }

        Ok(Self {
            major: major.unwrap_or(0),
            minor: minor.flatten(),
            patch: patch.flatten(),
        })
    }
}

fn parse_component(version: &str, part: Option<&str>) -> Result<Option<u32>, VersionError> {
    match part {
        None => Ok(None),
        Some(p) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => p
            .parse::<u32>()
            .map(Some)
            .map_err(|_| VersionError::InvalidComponent {
                version: version.to_string(),
                component: p.to_string(),
            }),
        Some(p) => Err(VersionError::InvalidComponent {
            version: version.to_string(),
            component: p.to_string(),
        }),
    }
}

impl TryFrom<String> for PhpVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PhpVersion> for String {
    fn from(version: PhpVersion) -> Self {
        version.to_string()
    }
}

/// Resolve the configured target version once per scan.
///
/// Absent or malformed values both yield `None`, meaning every rule
/// threshold is checked unconditionally.
pub fn resolve_target_version(raw: Option<&str>) -> Option<PhpVersion> {
    let raw = raw?;
    match raw.parse::<PhpVersion>() {
        Ok(version) => Some(version),
        Err(e) => {
            tracing::warn!(test_version = raw, error = %e, "ignoring malformed target version");
            None
        }
    }
}

/// Version parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("version string is empty")]
    Empty,

    #[error("invalid component '{component}' in version '{version}'")]
    InvalidComponent { version: String, component: String },

    #[error("version '{0}' has more than three components")]
    TooManyComponents(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PhpVersion {
        s.parse().unwrap()
    }

    #[test]
    fn ordering_is_component_wise() {
        assert!(v("5.4") < v("5.5"));
        assert!(v("5.5") < v("5.5.1"));
        assert!(v("5.10") > v("5.9"));
        assert!(v("7") > v("5.6.40"));
    }

    #[test]
    fn missing_components_are_zero() {
        assert_eq!(v("5.5"), v("5.5.0"));
        assert_eq!(v("7"), v("7.0.0"));
        assert_eq!(v("5.5").cmp(&v("5.5.0")), Ordering::Equal);
    }

    #[test]
    fn display_preserves_declared_form() {
        assert_eq!(v("5.4").to_string(), "5.4");
        assert_eq!(v("5.5.1").to_string(), "5.5.1");
        assert_eq!(v("7").to_string(), "7");
        assert_eq!(PhpVersion::with_patch(8, 1, 2).to_string(), "8.1.2");
    }

    #[test]
    fn rejects_malformed_versions() {
        assert_eq!("".parse::<PhpVersion>(), Err(VersionError::Empty));
        assert!("5.x".parse::<PhpVersion>().is_err());
        assert!("5..4".parse::<PhpVersion>().is_err());
        assert!("-5.4".parse::<PhpVersion>().is_err());
        assert!(matches!(
            "5.4.3.2".parse::<PhpVersion>(),
            Err(VersionError::TooManyComponents(_))
        ));
    }

    #[test]
    fn target_version_resolution() {
        assert_eq!(resolve_target_version(None), None);
        assert_eq!(resolve_target_version(Some("5.6")), Some(PhpVersion::new(5, 6)));
        assert_eq!(resolve_target_version(Some("not-a-version")), None);
    }

    #[test]
    fn serde_as_string() {
        let version: PhpVersion = serde_json::from_str("\"5.5\"").unwrap();
        assert_eq!(version, PhpVersion::new(5, 5));
        assert_eq!(serde_json::to_string(&version).unwrap(), "\"5.5\"");
        assert!(serde_json::from_str::<PhpVersion>("\"five\"").is_err());
    }
}
