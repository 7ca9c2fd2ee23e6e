//! Member identity and push address.
//!
//! A member is identified by an app-generated device id. The push token used
//! to reach that device is a separate value and may change over time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// Identity of a group member (an app-generated device id).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

impl MemberId {
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if s.trim().is_empty() {
            return Err(TypesError::EmptyMemberId);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for MemberId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<MemberId> for String {
    fn from(id: MemberId) -> Self {
        id.0
    }
}

/// Push-gateway address of a member's device.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PushToken(String);

impl PushToken {
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if s.trim().is_empty() {
            return Err(TypesError::EmptyPushToken);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PushToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PushToken {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<PushToken> for String {
    fn from(token: PushToken) -> Self {
        token.0
    }
}
