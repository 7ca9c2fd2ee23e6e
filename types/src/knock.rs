//! Knock session identifiers and notification kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::TypesError;

/// Unique identifier of one knock attempt.
///
/// Uses UUID v7, so ids are time-ordered and unique across concurrently open
/// sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnockId(Uuid);

impl KnockId {
    /// Generate a new knock id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn parse(s: &str) -> Result<Self, TypesError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| TypesError::InvalidKnockId(s.to_string()))
    }
}

impl fmt::Display for KnockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminator carried in every push payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KnockKind {
    /// Silent wake-up asking the receiver to report its address.
    KnockAttempt,
    /// User-visible notification sent after an address match.
    ConfirmedKnock,
}

impl KnockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KnockAttempt => "knock-attempt",
            Self::ConfirmedKnock => "confirmed-knock",
        }
    }
}

impl fmt::Display for KnockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
