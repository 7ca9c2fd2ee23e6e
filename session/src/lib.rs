//! Knock session registry.
//!
//! A knock is a two-phase handshake gated on shared network presence:
//!
//! 1. The sender initiates. The registry opens a [`PendingKnock`] holding the
//!    sender's observed address and sends a silent "knock-attempt" push to
//!    every other group member.
//! 2. Each woken receiver reports its own observed address. On an exact match
//!    the registry schedules a user-visible "confirmed-knock" push to that
//!    receiver after a short delay, provided the session is still open then.
//!
//! Sessions live in memory only and expire after a fixed TTL whatever the
//! outcome. Matching is a per-receiver side effect; there is no session-wide
//! "matched" state.

pub mod config;
pub mod error;
pub mod registry;
pub mod session;
pub mod stats;

pub use config::KnockConfig;
pub use error::{KnockError, Missing};
pub use registry::{InitiateOutcome, KnockRegistry};
pub use session::PendingKnock;
pub use stats::{RegistryStats, StatsSnapshot};
