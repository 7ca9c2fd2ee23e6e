//! Gateway contract.

use async_trait::async_trait;
use knock_types::{redact, PushMessage, PushToken};

use crate::error::PushError;

/// Delivers one push message to one device.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, token: &PushToken, message: &PushMessage) -> Result<(), PushError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Gateway that only logs what it would have sent.
///
/// Used when no push endpoint is configured (local development).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPushGateway;

#[async_trait]
impl PushGateway for LogPushGateway {
    async fn send(&self, token: &PushToken, message: &PushMessage) -> Result<(), PushError> {
        tracing::info!(
            token = %redact(token.as_str()),
            kind = %message.kind,
            knock_id = ?message.knock_id,
            title = %message.title,
            "push (log only)"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
