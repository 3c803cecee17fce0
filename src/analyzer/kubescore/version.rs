//! Kubernetes platform version (`major.minor`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

static VERSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v?(\d+)\.(\d+)(?:\.\d+)?$").expect("static regex"));

/// Errors produced when parsing a version string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("invalid Kubernetes version '{0}', use the format \"vN.NN\"")]
    Malformed(String),
}

/// A Kubernetes version, compared by (major, minor). Patch levels are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KubernetesVersion {
    pub major: u32,
    pub minor: u32,
}

impl KubernetesVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse `vN.M`, `N.M` or `vN.M.P`.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let malformed = || VersionError::Malformed(s.to_string());
        let caps = VERSION_REGEX.captures(s.trim()).ok_or_else(malformed)?;
        let major = caps[1].parse().map_err(|_| malformed())?;
        let minor = caps[2].parse().map_err(|_| malformed())?;
        Ok(Self { major, minor })
    }
}

impl Default for KubernetesVersion {
    fn default() -> Self {
        Self::new(1, 18)
    }
}

impl FromStr for KubernetesVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KubernetesVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

impl Serialize for KubernetesVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KubernetesVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepted_forms() {
        assert_eq!(KubernetesVersion::parse("v1.18"), Ok(KubernetesVersion::new(1, 18)));
        assert_eq!(KubernetesVersion::parse("1.21"), Ok(KubernetesVersion::new(1, 21)));
        assert_eq!(KubernetesVersion::parse("v1.19.4"), Ok(KubernetesVersion::new(1, 19)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "v1", "1.x", "latest", "v1.18-rc1", "vv1.18"] {
            assert!(KubernetesVersion::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_ordering_is_numeric() {
        assert!(KubernetesVersion::new(1, 9) < KubernetesVersion::new(1, 18));
        assert!(KubernetesVersion::new(2, 0) > KubernetesVersion::new(1, 30));
    }

    #[test]
    fn test_display_round_trip() {
        let v = KubernetesVersion::new(1, 22);
        assert_eq!(v.to_string(), "v1.22");
        assert_eq!(v.to_string().parse::<KubernetesVersion>(), Ok(v));
    }
}
