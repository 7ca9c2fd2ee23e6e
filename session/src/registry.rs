//! The knock session registry.

use std::sync::Arc;

use dashmap::DashMap;
use knock_groups::{MembershipResolver, Recipient};
use knock_push::{attempt_message, confirmed_message, PushGateway};
use knock_types::{redact, GroupCode, KnockId, MemberId, NetworkAddress};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::config::KnockConfig;
use crate::error::{KnockError, Missing};
use crate::session::PendingKnock;
use crate::stats::{RegistryStats, StatsSnapshot};

/// Result of a successful initiation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitiateOutcome {
    pub knock_id: KnockId,
    /// Receivers a knock-attempt was dispatched to.
    pub notified: usize,
    /// Dispatches the gateway accepted.
    pub delivered: usize,
    /// Receivers whose dispatch failed.
    pub failed: Vec<MemberId>,
}

impl InitiateOutcome {
    /// The delivery failure to surface to the caller, if any dispatch failed.
    pub fn delivery_failure(&self) -> Option<KnockError> {
        (!self.failed.is_empty()).then(|| KnockError::DeliveryPartialFailure {
            failed: self.failed.len(),
            attempted: self.notified,
        })
    }
}

/// Coordinates knock sessions.
///
/// Cheap to clone; clones share the same session map. Sessions are keyed by
/// [`KnockId`] in a concurrent map, so initiations and reports against
/// different sessions never contend on a global lock.
#[derive(Clone)]
pub struct KnockRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    sessions: DashMap<KnockId, PendingKnock>,
    resolver: MembershipResolver,
    gateway: Arc<dyn PushGateway>,
    config: KnockConfig,
    stats: RegistryStats,
}

impl KnockRegistry {
    pub fn new(
        resolver: MembershipResolver,
        gateway: Arc<dyn PushGateway>,
        config: KnockConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions: DashMap::new(),
                resolver,
                gateway,
                config,
                stats: RegistryStats::default(),
            }),
        }
    }

    pub fn config(&self) -> KnockConfig {
        self.inner.config
    }

    /// Open a knock session and wake every other member of `group`.
    ///
    /// Fails with `NotFound` for an unknown group, `NotMember` if `sender`
    /// does not belong to it, and `NoRecipients` if nobody else does; no
    /// session is created in those cases. Push failures do not fail the call;
    /// they are listed in the outcome.
    ///
    /// Must be called from within a Tokio runtime: expiry is scheduled as a
    /// spawned task.
    pub async fn initiate(
        &self,
        sender: &MemberId,
        group: &GroupCode,
        sender_address: NetworkAddress,
    ) -> Result<InitiateOutcome, KnockError> {
        let recipients = self
            .inner
            .resolver
            .recipients_for(group, sender)
            .await?
            .ok_or_else(|| KnockError::NotMember(group.clone()))?;
        if recipients.is_empty() {
            debug!(group = %group, sender = %redact(sender.as_str()), "knock with no recipients");
            return Err(KnockError::NoRecipients(group.clone()));
        }

        let knock_id = KnockId::generate();
        let session = PendingKnock::new(
            knock_id,
            sender.clone(),
            sender_address,
            group.clone(),
            Instant::now(),
        );
        self.inner.sessions.insert(knock_id, session);
        RegistryStats::bump(&self.inner.stats.knocks_initiated);
        self.schedule_expiry(knock_id);

        info!(
            %knock_id,
            group = %group,
            sender = %redact(sender.as_str()),
            recipients = recipients.len(),
            "knock initiated"
        );

        let notified = recipients.len();
        let failed = self.dispatch_attempts(knock_id, group, recipients).await;
        let delivered = notified - failed.len();

        let outcome = InitiateOutcome {
            knock_id,
            notified,
            delivered,
            failed,
        };
        if let Some(failure) = outcome.delivery_failure() {
            warn!(%knock_id, group = %group, "{failure}");
        }
        Ok(outcome)
    }

    /// Record a receiver's observed address for an open knock.
    ///
    /// Returns whether it matches the sender's address. On the first match
    /// for a receiver, a confirmed knock is scheduled after the configured
    /// delay; it is dropped if the session has expired by then. Reporting
    /// again is harmless.
    pub async fn report(
        &self,
        receiver: &MemberId,
        knock_id: KnockId,
        receiver_address: &NetworkAddress,
    ) -> Result<bool, KnockError> {
        let (group, sender) = {
            let session = self.open_session(knock_id)?;
            (session.group.clone(), session.sender.clone())
        };
        RegistryStats::bump(&self.inner.stats.reports_received);

        // Membership can change mid-flight; the latest store read wins.
        if receiver == &sender || !self.inner.resolver.is_member(&group, receiver).await? {
            return Err(KnockError::NotMember(group));
        }

        let (matched, first_match) = {
            let mut session = self.open_session_mut(knock_id)?;
            session.reported.insert(receiver.clone());
            let matched = session.matches(receiver_address);
            let first_match = matched && session.confirmed.insert(receiver.clone());
            (matched, first_match)
        };

        debug!(
            %knock_id,
            receiver = %redact(receiver.as_str()),
            matched,
            "address reported"
        );

        if matched {
            RegistryStats::bump(&self.inner.stats.matches);
        }
        if first_match {
            self.schedule_confirmation(knock_id, group, receiver.clone());
        }
        Ok(matched)
    }

    /// A copy of an open session, `None` once it has expired.
    pub fn session(&self, knock_id: &KnockId) -> Option<PendingKnock> {
        self.open_session(*knock_id).ok().map(|s| s.value().clone())
    }

    /// Number of sessions currently held, including any expired ones whose
    /// cleanup has not run yet.
    pub fn open_count(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Drop every session. Pending confirmations see the sessions gone and
    /// do nothing.
    pub fn clear(&self) {
        let dropped = self.inner.sessions.len();
        self.inner.sessions.clear();
        if dropped > 0 {
            info!(dropped, "knock sessions discarded");
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    // ── internals ──────────────────────────────────────────────────────────

    fn open_session(
        &self,
        knock_id: KnockId,
    ) -> Result<dashmap::mapref::one::Ref<'_, KnockId, PendingKnock>, KnockError> {
        let session = self
            .inner
            .sessions
            .get(&knock_id)
            .ok_or(KnockError::NotFound(Missing::Knock(knock_id)))?;
        if session.is_expired(self.inner.config.ttl, Instant::now()) {
            drop(session);
            self.expire(knock_id);
            return Err(KnockError::NotFound(Missing::Knock(knock_id)));
        }
        Ok(session)
    }

    fn open_session_mut(
        &self,
        knock_id: KnockId,
    ) -> Result<dashmap::mapref::one::RefMut<'_, KnockId, PendingKnock>, KnockError> {
        let session = self
            .inner
            .sessions
            .get_mut(&knock_id)
            .ok_or(KnockError::NotFound(Missing::Knock(knock_id)))?;
        if session.is_expired(self.inner.config.ttl, Instant::now()) {
            drop(session);
            self.expire(knock_id);
            return Err(KnockError::NotFound(Missing::Knock(knock_id)));
        }
        Ok(session)
    }

    fn expire(&self, knock_id: KnockId) {
        if self.inner.sessions.remove(&knock_id).is_some() {
            RegistryStats::bump(&self.inner.stats.sessions_expired);
            debug!(%knock_id, "knock session expired");
        }
    }

    fn schedule_expiry(&self, knock_id: KnockId) {
        let registry = self.clone();
        let ttl = self.inner.config.ttl;
        tokio::spawn(async move {
            time::sleep(ttl).await;
            registry.expire(knock_id);
        });
    }

    /// Send knock-attempts to every recipient concurrently. Returns the
    /// members whose delivery failed.
    async fn dispatch_attempts(
        &self,
        knock_id: KnockId,
        group: &GroupCode,
        recipients: Vec<Recipient>,
    ) -> Vec<MemberId> {
        let message = attempt_message(knock_id, group.as_str());
        let mut handles = Vec::with_capacity(recipients.len());

        for Recipient { member, push_token } in recipients {
            let gateway = Arc::clone(&self.inner.gateway);
            let message = message.clone();
            let handle = tokio::spawn(async move { gateway.send(&push_token, &message).await });
            handles.push((member, handle));
        }

        let mut failed = Vec::new();
        for (member, handle) in handles {
            match handle.await {
                Ok(Ok(())) => RegistryStats::bump(&self.inner.stats.attempts_sent),
                Ok(Err(e)) => {
                    warn!(
                        %knock_id,
                        member = %redact(member.as_str()),
                        gateway = self.inner.gateway.name(),
                        "knock-attempt delivery failed: {e}"
                    );
                    failed.push(member);
                }
                Err(e) => {
                    warn!(%knock_id, member = %redact(member.as_str()), "knock-attempt task failed: {e}");
                    failed.push(member);
                }
            }
        }
        RegistryStats::add(&self.inner.stats.attempts_failed, failed.len());
        failed
    }

    fn schedule_confirmation(&self, knock_id: KnockId, group: GroupCode, receiver: MemberId) {
        let registry = self.clone();
        let delay = self.inner.config.confirm_delay;
        tokio::spawn(async move {
            time::sleep(delay).await;
            registry.fire_confirmation(knock_id, &group, &receiver).await;
        });
    }

    async fn fire_confirmation(&self, knock_id: KnockId, group: &GroupCode, receiver: &MemberId) {
        let stats = &self.inner.stats;
        let still_open = self.open_session(knock_id).is_ok();
        if !still_open {
            RegistryStats::bump(&stats.confirmations_dropped);
            debug!(%knock_id, receiver = %redact(receiver.as_str()), "session gone, confirmed knock suppressed");
            return;
        }

        let token = match self.inner.resolver.push_token(group, receiver).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                RegistryStats::bump(&stats.confirmations_dropped);
                debug!(%knock_id, receiver = %redact(receiver.as_str()), "receiver left group, confirmed knock suppressed");
                return;
            }
            Err(e) => {
                RegistryStats::bump(&stats.confirmations_dropped);
                warn!(%knock_id, "push token lookup failed: {e}");
                return;
            }
        };

        match self.inner.gateway.send(&token, &confirmed_message()).await {
            Ok(()) => {
                RegistryStats::bump(&stats.confirmations_sent);
                info!(%knock_id, receiver = %redact(receiver.as_str()), "confirmed knock sent");
            }
            Err(e) => {
                RegistryStats::bump(&stats.confirmations_dropped);
                warn!(
                    %knock_id,
                    receiver = %redact(receiver.as_str()),
                    gateway = self.inner.gateway.name(),
                    "confirmed knock delivery failed: {e}"
                );
            }
        }
    }
}
