//! Registry timing parameters.

use std::time::Duration;

/// How long a knock session stays open.
pub const DEFAULT_KNOCK_TTL: Duration = Duration::from_secs(20);

/// Delay between an address match and the confirmed-knock push.
pub const DEFAULT_CONFIRM_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KnockConfig {
    /// Session lifetime, measured from initiation.
    pub ttl: Duration,
    /// Delay before a matched receiver's confirmed knock is sent.
    pub confirm_delay: Duration,
}

impl KnockConfig {
    pub fn from_secs(ttl_secs: u64, confirm_delay_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            confirm_delay: Duration::from_secs(confirm_delay_secs),
        }
    }
}

impl Default for KnockConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_KNOCK_TTL,
            confirm_delay: DEFAULT_CONFIRM_DELAY,
        }
    }
}
