//! The ephemeral record behind one knock attempt.

use std::collections::HashSet;
use std::time::Duration;

use knock_types::{GroupCode, KnockId, MemberId, NetworkAddress};
use tokio::time::Instant;

/// One open knock session. Owned exclusively by the registry.
#[derive(Clone, Debug)]
pub struct PendingKnock {
    pub knock_id: KnockId,
    pub sender: MemberId,
    /// Fixed at creation; only receiver reports are compared against it.
    pub sender_address: NetworkAddress,
    pub group: GroupCode,
    pub created_at: Instant,
    /// Members that have reported at least once.
    pub reported: HashSet<MemberId>,
    /// Members a confirmed knock has been scheduled for. At most one each.
    pub confirmed: HashSet<MemberId>,
}

impl PendingKnock {
    pub fn new(
        knock_id: KnockId,
        sender: MemberId,
        sender_address: NetworkAddress,
        group: GroupCode,
        created_at: Instant,
    ) -> Self {
        Self {
            knock_id,
            sender,
            sender_address,
            group,
            created_at,
            reported: HashSet::new(),
            confirmed: HashSet::new(),
        }
    }

    /// Whether the session's lifetime has elapsed at `now`.
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now >= self.created_at + ttl
    }

    pub fn matches(&self, address: &NetworkAddress) -> bool {
        &self.sender_address == address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knock(now: Instant) -> PendingKnock {
        PendingKnock::new(
            KnockId::generate(),
            MemberId::new("a").unwrap(),
            NetworkAddress::new("1.2.3.4"),
            GroupCode::parse("HOME01").unwrap(),
            now,
        )
    }

    #[test]
    fn expiry_is_inclusive_of_deadline() {
        let start = Instant::now();
        let k = knock(start);
        let ttl = Duration::from_secs(20);
        assert!(!k.is_expired(ttl, start));
        assert!(!k.is_expired(ttl, start + Duration::from_millis(19_999)));
        assert!(k.is_expired(ttl, start + ttl));
    }

    #[test]
    fn match_is_exact_string_equality() {
        let k = knock(Instant::now());
        assert!(k.matches(&NetworkAddress::new("1.2.3.4")));
        assert!(!k.matches(&NetworkAddress::new("1.2.3.4 ")));
        assert!(!k.matches(&NetworkAddress::new("9.9.9.9")));
    }
}
