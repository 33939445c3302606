//! Version types for the persisted settings model.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::VersionParseError;

/// Schema version of the persisted settings document.
///
/// Persisted as the strings `"V1"`, `"V2"` and `"V3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelVersion {
    /// Original single-blob format.
    V1,
    /// Crafting systems stored as one nested blob with their parts.
    V2,
    /// Normalised entity and collection stores.
    V3,
}

impl ModelVersion {
    /// Version written by this release.
    pub const CURRENT: Self = Self::V3;

    /// All known versions, oldest first.
    const ALL: [Self; 3] = [Self::V1, Self::V2, Self::V3];

    /// Returns the string form used in settings storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "V1",
            Self::V2 => "V2",
            Self::V3 => "V3",
        }
    }

    /// Checks if data at this version must be migrated to reach `CURRENT`.
    #[must_use]
    pub fn needs_migration(self) -> bool {
        self < Self::CURRENT
    }
}

impl Default for ModelVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl std::fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|version| version.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VersionParseError::Unknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for version in ModelVersion::ALL {
            let parsed: ModelVersion = version.to_string().parse().expect("parse");
            assert_eq!(parsed, version);
        }
        assert_eq!("v2".parse::<ModelVersion>(), Ok(ModelVersion::V2));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "V9".parse::<ModelVersion>().expect_err("unknown");
        assert_eq!(err, VersionParseError::Unknown("V9".to_string()));
    }

    #[test]
    fn test_needs_migration() {
        assert!(ModelVersion::V1.needs_migration());
        assert!(ModelVersion::V2.needs_migration());
        assert!(!ModelVersion::V3.needs_migration());
    }

    #[test]
    fn test_serde_form() {
        let json = serde_json::to_string(&ModelVersion::V3).expect("serialize");
        assert_eq!(json, "\"V3\"");
    }
}
