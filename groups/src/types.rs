//! Group document types.

use std::collections::BTreeMap;

use knock_types::{GroupCode, MemberId, NetworkAddress, PushToken, Timestamp};
use serde::{Deserialize, Serialize};

/// A group document as held by the document store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Shareable code, also the document key.
    pub code: GroupCode,
    /// Display name chosen by the creator.
    pub name: String,
    pub created_at: Timestamp,
    /// Member identity to per-member metadata.
    #[serde(default)]
    pub members: BTreeMap<MemberId, MemberInfo>,
}

/// Per-member metadata stored in the group document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    /// Where to deliver pushes for this member's device.
    pub push_token: PushToken,
    pub joined_at: Timestamp,
    /// Address observed when the member last joined or refreshed.
    ///
    /// Informational only; knock matching always compares session-scoped
    /// addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_address: Option<NetworkAddress>,
}

impl Group {
    pub fn new(code: GroupCode, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            created_at: Timestamp::now(),
            members: BTreeMap::new(),
        }
    }

    pub fn is_member(&self, member: &MemberId) -> bool {
        self.members.contains_key(member)
    }

    /// Members other than `excluding`, in stable order.
    pub fn others<'a>(
        &'a self,
        excluding: &'a MemberId,
    ) -> impl Iterator<Item = (&'a MemberId, &'a MemberInfo)> + 'a {
        self.members.iter().filter(move |(id, _)| *id != excluding)
    }
}
