use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid safe version: {0}")]
pub struct VersionError(pub String);

/// Contract version of the Safe being acted on.
///
/// Version gates two behaviors: which off-chain signing methods the account
/// supports, and whether `safeTxGas` must be estimated up front (legacy
/// versions require it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SafeVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl SafeVersion {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Typed-data signing landed in 1.3.0; older accounts only support
    /// plain hash signing.
    pub fn supports_typed_data_signing(&self) -> bool {
        *self >= SafeVersion::new(1, 3, 0)
    }

    /// Pre-1.3.0 contracts reject execution unless `safeTxGas` was set from
    /// an estimation.
    pub fn requires_safe_tx_gas(&self) -> bool {
        *self < SafeVersion::new(1, 3, 0)
    }
}

impl fmt::Display for SafeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SafeVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Tolerate suffixes like "1.3.0+L2"
        let core = s.split('+').next().unwrap_or(s);
        let mut parts = core.split('.');
        let mut next = |what: &str| -> Result<u16, VersionError> {
            parts
                .next()
                .ok_or_else(|| VersionError(format!("{s}: missing {what}")))?
                .parse()
                .map_err(|_| VersionError(s.to_string()))
        };
        let major = next("major")?;
        let minor = next("minor")?;
        let patch = next("patch")?;
        Ok(SafeVersion::new(major, minor, patch))
    }
}

impl Serialize for SafeVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SafeVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_suffixed() {
        assert_eq!("1.3.0".parse::<SafeVersion>().unwrap(), SafeVersion::new(1, 3, 0));
        assert_eq!(
            "1.4.1+L2".parse::<SafeVersion>().unwrap(),
            SafeVersion::new(1, 4, 1)
        );
        assert!("1.3".parse::<SafeVersion>().is_err());
    }

    #[test]
    fn version_gates() {
        assert!(SafeVersion::new(1, 3, 0).supports_typed_data_signing());
        assert!(SafeVersion::new(1, 4, 1).supports_typed_data_signing());
        assert!(!SafeVersion::new(1, 1, 1).supports_typed_data_signing());
        assert!(SafeVersion::new(1, 1, 1).requires_safe_tx_gas());
        assert!(!SafeVersion::new(1, 3, 0).requires_safe_tx_gas());
    }
}
