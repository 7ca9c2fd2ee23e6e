//! Document store contracts.

use async_trait::async_trait;
use knock_types::{GroupCode, MemberId, NetworkAddress, PushToken};

use crate::error::GroupError;
use crate::types::Group;

/// Read access to group documents. The sole source of truth for membership.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Fetch a group document, `Ok(None)` if it does not exist.
    async fn get_group(&self, code: &GroupCode) -> Result<Option<Group>, GroupError>;
}

/// Write access used by the group management surface.
#[async_trait]
pub trait GroupDirectory: GroupStore {
    /// Create a group whose only member is `creator`.
    async fn create_group(
        &self,
        name: &str,
        creator: MemberId,
        push_token: PushToken,
        address: Option<NetworkAddress>,
    ) -> Result<Group, GroupError>;

    /// Add a member, or refresh its push token and address if already present.
    async fn upsert_member(
        &self,
        code: &GroupCode,
        member: MemberId,
        push_token: PushToken,
        address: Option<NetworkAddress>,
    ) -> Result<Group, GroupError>;

    /// Remove a member. Returns whether it was present.
    async fn remove_member(&self, code: &GroupCode, member: &MemberId)
        -> Result<bool, GroupError>;
}
