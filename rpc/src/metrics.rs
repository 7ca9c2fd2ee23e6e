//! Prometheus metrics for the knock service.
//!
//! [`KnockMetrics`] owns a dedicated [`Registry`]. Counters are synced from
//! the session registry's own statistics at scrape time, so the knock path
//! never touches Prometheus types.

use knock_session::StatsSnapshot;
use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

pub struct KnockMetrics {
    registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    knocks_initiated: IntCounter,
    attempts_sent: IntCounter,
    attempts_failed: IntCounter,
    reports_received: IntCounter,
    matches: IntCounter,
    confirmations_sent: IntCounter,
    confirmations_dropped: IntCounter,
    sessions_expired: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    open_sessions: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, prometheus::Error> {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
}

impl KnockMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        Ok(Self {
            knocks_initiated: counter(&registry, "knock_initiated_total", "Knock sessions opened")?,
            attempts_sent: counter(&registry, "knock_attempts_sent_total", "Knock-attempt pushes delivered")?,
            attempts_failed: counter(&registry, "knock_attempts_failed_total", "Knock-attempt pushes that failed")?,
            reports_received: counter(&registry, "knock_reports_total", "Address reports against open knocks")?,
            matches: counter(&registry, "knock_matches_total", "Address reports matching the sender")?,
            confirmations_sent: counter(&registry, "knock_confirmed_sent_total", "Confirmed-knock pushes delivered")?,
            confirmations_dropped: counter(
                &registry,
                "knock_confirmed_dropped_total",
                "Confirmed knocks suppressed or undeliverable",
            )?,
            sessions_expired: counter(&registry, "knock_sessions_expired_total", "Knock sessions expired")?,
            open_sessions: register_int_gauge_with_registry!(
                Opts::new("knock_open_sessions", "Knock sessions currently held"),
                registry
            )?,
            registry,
        })
    }

    /// Bring every metric up to date with the registry's statistics.
    pub fn observe(&self, stats: &StatsSnapshot, open_sessions: usize) {
        fn sync(counter: &IntCounter, value: u64) {
            let current = counter.get();
            if value > current {
                counter.inc_by(value - current);
            }
        }
        sync(&self.knocks_initiated, stats.knocks_initiated);
        sync(&self.attempts_sent, stats.attempts_sent);
        sync(&self.attempts_failed, stats.attempts_failed);
        sync(&self.reports_received, stats.reports_received);
        sync(&self.matches, stats.matches);
        sync(&self.confirmations_sent, stats.confirmations_sent);
        sync(&self.confirmations_dropped, stats.confirmations_dropped);
        sync(&self.sessions_expired, stats.sessions_expired);
        self.open_sessions
            .set(i64::try_from(open_sessions).unwrap_or(i64::MAX));
    }

    /// Encode all metrics in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
