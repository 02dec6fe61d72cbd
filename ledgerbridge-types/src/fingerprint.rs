//! Content fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a hex-encoded SHA-256 digest.
const HEX_LEN: usize = 64;

/// A hex-encoded SHA-256 digest of a record set's canonical serialization.
///
/// Always 64 lowercase hex characters; parsing rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps a raw 32-byte digest.
    #[must_use]
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// Returns the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first `n` hex characters, for log lines.
    pub fn short(&self, n: usize) -> &str {
        &self.0[..n.min(HEX_LEN)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.len() == HEX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(crate::Error::InvalidFingerprint(s.to_string()))
        }
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}
