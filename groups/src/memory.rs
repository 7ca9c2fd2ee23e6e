//! In-process group store.

use std::collections::HashMap;

use async_trait::async_trait;
use knock_types::{redact, GroupCode, MemberId, NetworkAddress, PushToken, Timestamp};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::GroupError;
use crate::store::{GroupDirectory, GroupStore};
use crate::types::{Group, MemberInfo};

/// Attempts at drawing an unused group code before giving up.
const MAX_CODE_ATTEMPTS: usize = 16;

/// Group documents held in memory. Contents are lost on restart.
pub struct MemoryGroupStore {
    groups: RwLock<HashMap<GroupCode, Group>>,
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored groups.
    pub async fn len(&self) -> usize {
        self.groups.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.groups.read().await.is_empty()
    }
}

impl Default for MemoryGroupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupStore for MemoryGroupStore {
    async fn get_group(&self, code: &GroupCode) -> Result<Option<Group>, GroupError> {
        Ok(self.groups.read().await.get(code).cloned())
    }
}

#[async_trait]
impl GroupDirectory for MemoryGroupStore {
    async fn create_group(
        &self,
        name: &str,
        creator: MemberId,
        push_token: PushToken,
        address: Option<NetworkAddress>,
    ) -> Result<Group, GroupError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GroupError::InvalidRequest("group name must not be empty".into()));
        }

        let mut groups = self.groups.write().await;
        let code = (0..MAX_CODE_ATTEMPTS)
            .map(|_| GroupCode::generate())
            .find(|code| !groups.contains_key(code))
            .ok_or_else(|| GroupError::InvalidRequest("group code space exhausted".into()))?;

        let mut group = Group::new(code.clone(), name);
        group.members.insert(
            creator.clone(),
            MemberInfo {
                push_token,
                joined_at: group.created_at,
                last_address: address,
            },
        );
        groups.insert(code.clone(), group.clone());

        info!(group = %code, creator = %redact(creator.as_str()), "group created");
        Ok(group)
    }

    async fn upsert_member(
        &self,
        code: &GroupCode,
        member: MemberId,
        push_token: PushToken,
        address: Option<NetworkAddress>,
    ) -> Result<Group, GroupError> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(code)
            .ok_or_else(|| GroupError::GroupNotFound(code.clone()))?;

        let now = Timestamp::now();
        let joined_at = group
            .members
            .get(&member)
            .map_or(now, |existing| existing.joined_at);
        debug!(group = %code, member = %redact(member.as_str()), "member upserted");
        group.members.insert(
            member,
            MemberInfo {
                push_token,
                joined_at,
                last_address: address,
            },
        );
        Ok(group.clone())
    }

    async fn remove_member(
        &self,
        code: &GroupCode,
        member: &MemberId,
    ) -> Result<bool, GroupError> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(code)
            .ok_or_else(|| GroupError::GroupNotFound(code.clone()))?;
        let removed = group.members.remove(member).is_some();
        if removed {
            debug!(group = %code, member = %redact(member.as_str()), "member removed");
        }
        Ok(removed)
    }
}
