//! Nullable push gateway: records pushes instead of sending them.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use knock_push::{PushError, PushGateway};
use knock_types::{KnockKind, PushMessage, PushToken};

/// One recorded send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentPush {
    pub token: PushToken,
    pub message: PushMessage,
}

/// A push gateway that records sends.
///
/// Failed sends (tokens registered via [`fail_token`](Self::fail_token)) are
/// not recorded.
#[derive(Default)]
pub struct NullPushGateway {
    sent: Mutex<Vec<SentPush>>,
    failing: Mutex<HashSet<String>>,
    latency: Mutex<Duration>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NullPushGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `token` fail.
    pub fn fail_token(&self, token: &str) {
        lock(&self.failing).insert(token.to_string());
    }

    /// Delay every send by `latency` (runtime time, so paused clocks apply).
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    /// All successful sends, in completion order.
    pub fn sent(&self) -> Vec<SentPush> {
        lock(&self.sent).clone()
    }

    pub fn sent_of_kind(&self, kind: KnockKind) -> Vec<SentPush> {
        lock(&self.sent)
            .iter()
            .filter(|p| p.message.kind == kind)
            .cloned()
            .collect()
    }

    pub fn sent_to(&self, token: &str) -> Vec<SentPush> {
        lock(&self.sent)
            .iter()
            .filter(|p| p.token.as_str() == token)
            .cloned()
            .collect()
    }

    /// Clear recorded sends and injected failures.
    pub fn reset(&self) {
        lock(&self.sent).clear();
        lock(&self.failing).clear();
        *lock(&self.latency) = Duration::ZERO;
    }
}

#[async_trait]
impl PushGateway for NullPushGateway {
    async fn send(&self, token: &PushToken, message: &PushMessage) -> Result<(), PushError> {
        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if lock(&self.failing).contains(token.as_str()) {
            return Err(PushError::Rejected(format!("{token} marked failing")));
        }
        lock(&self.sent).push(SentPush {
            token: token.clone(),
            message: message.clone(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}
