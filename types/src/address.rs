//! Observed public network address.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The public address a request was observed to come from.
///
/// Treated as an opaque, comparable string: two members are considered to be
/// on the same network exactly when their observed addresses are equal. No
/// syntax validation is performed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkAddress(String);

impl NetworkAddress {
    /// Prefix carried by IPv4 addresses observed through a dual-stack socket.
    pub const MAPPED_V4_PREFIX: &'static str = "::ffff:";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build an address from a raw observation, trimming whitespace and the
    /// IPv4-mapped IPv6 prefix so `::ffff:1.2.3.4` and `1.2.3.4` compare equal.
    pub fn normalized(raw: &str) -> Self {
        let trimmed = raw.trim();
        let stripped = trimmed
            .strip_prefix(Self::MAPPED_V4_PREFIX)
            .unwrap_or(trimmed);
        Self(stripped.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NetworkAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
