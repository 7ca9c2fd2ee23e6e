//! Registry counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters for a registry.
#[derive(Debug, Default)]
pub struct RegistryStats {
    pub knocks_initiated: AtomicU64,
    pub attempts_sent: AtomicU64,
    pub attempts_failed: AtomicU64,
    pub reports_received: AtomicU64,
    pub matches: AtomicU64,
    pub confirmations_sent: AtomicU64,
    /// Confirmed knocks dropped because the session expired first, the
    /// receiver left the group, or delivery failed.
    pub confirmations_dropped: AtomicU64,
    pub sessions_expired: AtomicU64,
}

/// Point-in-time copy of [`RegistryStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatsSnapshot {
    pub knocks_initiated: u64,
    pub attempts_sent: u64,
    pub attempts_failed: u64,
    pub reports_received: u64,
    pub matches: u64,
    pub confirmations_sent: u64,
    pub confirmations_dropped: u64,
    pub sessions_expired: u64,
}

impl RegistryStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            knocks_initiated: self.knocks_initiated.load(Ordering::Relaxed),
            attempts_sent: self.attempts_sent.load(Ordering::Relaxed),
            attempts_failed: self.attempts_failed.load(Ordering::Relaxed),
            reports_received: self.reports_received.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            confirmations_sent: self.confirmations_sent.load(Ordering::Relaxed),
            confirmations_dropped: self.confirmations_dropped.load(Ordering::Relaxed),
            sessions_expired: self.sessions_expired.load(Ordering::Relaxed),
        }
    }
}
