//! Fundamental types for the knock protocol.
//!
//! This crate defines the identifiers shared across every other crate in the
//! workspace: member and group identities, knock session ids, observed network
//! addresses, push tokens, timestamps, and the push payload shape.

pub mod address;
pub mod error;
pub mod group;
pub mod knock;
pub mod member;
pub mod message;
pub mod time;

pub use address::NetworkAddress;
pub use error::TypesError;
pub use group::GroupCode;
pub use knock::{KnockId, KnockKind};
pub use member::{MemberId, PushToken};
pub use message::PushMessage;
pub use time::Timestamp;

/// Shorten an identifier for log output.
///
/// Member ids and push tokens are bearer-ish values; logs only ever carry a
/// short prefix followed by `...`.
pub fn redact(value: &str) -> String {
    const VISIBLE: usize = 10;
    match value.char_indices().nth(VISIBLE) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}
