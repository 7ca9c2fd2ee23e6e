//! Push payload handed to the notification gateway.

use serde::{Deserialize, Serialize};

use crate::{KnockId, KnockKind, Timestamp};

/// A single push notification addressed to one device.
///
/// The gateway decides how to render it; the knock protocol only relies on
/// `kind` and `knock_id` reaching the device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(rename = "type")]
    pub kind: KnockKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knock_id: Option<KnockId>,
    pub title: String,
    pub body: String,
    pub timestamp: Timestamp,
}

impl PushMessage {
    /// Whether the device should surface this message to the user.
    pub fn is_user_visible(&self) -> bool {
        self.kind == KnockKind::ConfirmedKnock
    }
}
