//! Admin API version selection.

use crate::error::ConfigError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Admin API version used to build the `/admin/api/{version}` base path.
///
/// # Example
///
/// ```rust
/// use shopify_sync::ApiVersion;
///
/// let version: ApiVersion = "2025-07".parse().unwrap();
/// assert_eq!(version, ApiVersion::V2025_07);
/// assert_eq!(version.to_string(), "2025-07");
/// assert!(ApiVersion::V2025_01 < ApiVersion::latest());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// API version 2025-01.
    V2025_01,
    /// API version 2025-04.
    V2025_04,
    /// API version 2025-07.
    V2025_07,
    /// API version 2025-10.
    V2025_10,
    /// The `unstable` version.
    Unstable,
    /// Any other well-formed `YYYY-MM` version.
    Custom(String),
}

impl ApiVersion {
    /// Returns the latest stable API version.
    #[must_use]
    pub const fn latest() -> Self {
        Self::V2025_10
    }

    /// Returns `true` for the named stable variants.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        !matches!(self, Self::Unstable | Self::Custom(_))
    }

    fn sort_key(&self) -> String {
        match self {
            Self::Unstable => "9999-99".to_string(),
            other => other.to_string(),
        }
    }

    fn is_valid_version_format(s: &str) -> bool {
        let bytes = s.as_bytes();
        bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit)
            && matches!(&s[5..], "01" | "04" | "07" | "10")
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::V2025_01 => "2025-01",
            Self::V2025_04 => "2025-04",
            Self::V2025_07 => "2025-07",
            Self::V2025_10 => "2025-10",
            Self::Unstable => "unstable",
            Self::Custom(version) => version,
        };
        f.write_str(s)
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "2025-01" => Ok(Self::V2025_01),
            "2025-04" => Ok(Self::V2025_04),
            "2025-07" => Ok(Self::V2025_07),
            "2025-10" => Ok(Self::V2025_10),
            "unstable" => Ok(Self::Unstable),
            other if Self::is_valid_version_format(other) => Ok(Self::Custom(other.to_string())),
            _ => Err(ConfigError::InvalidApiVersion {
                version: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_parses_known_and_future_versions() {
        assert_eq!("2025-04".parse::<ApiVersion>().unwrap(), ApiVersion::V2025_04);
        assert_eq!(
            "2026-01".parse::<ApiVersion>().unwrap(),
            ApiVersion::Custom("2026-01".to_string())
        );
        assert_eq!("UNSTABLE".parse::<ApiVersion>().unwrap(), ApiVersion::Unstable);
    }

    #[test]
    fn test_api_version_rejects_invalid() {
        assert!("2025-02".parse::<ApiVersion>().is_err());
        assert!("latest".parse::<ApiVersion>().is_err());
        assert!("".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn test_version_ordering_puts_unstable_last() {
        assert!(ApiVersion::V2025_01 < ApiVersion::V2025_10);
        assert!(ApiVersion::V2025_10 < ApiVersion::Custom("2026-01".to_string()));
        assert!(ApiVersion::Custom("2026-01".to_string()) < ApiVersion::Unstable);
    }

    #[test]
    fn test_latest_is_stable() {
        assert!(ApiVersion::latest().is_stable());
        assert!(!ApiVersion::Unstable.is_stable());
    }
}
