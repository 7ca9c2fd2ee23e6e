//! Membership resolution for the knock protocol.

use std::collections::BTreeSet;
use std::sync::Arc;

use knock_types::{GroupCode, MemberId, PushToken};

use crate::error::GroupError;
use crate::store::GroupStore;
use crate::types::Group;

/// A member to notify, with the push token currently registered for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipient {
    pub member: MemberId,
    pub push_token: PushToken,
}

/// Answers membership questions against the backing store.
///
/// Every call reads through to the store; nothing is cached, so a membership
/// change is visible to the very next call.
#[derive(Clone)]
pub struct MembershipResolver {
    store: Arc<dyn GroupStore>,
}

impl MembershipResolver {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { store }
    }

    async fn load(&self, code: &GroupCode) -> Result<Group, GroupError> {
        self.store
            .get_group(code)
            .await?
            .ok_or_else(|| GroupError::GroupNotFound(code.clone()))
    }

    /// Whether `member` currently belongs to the group.
    pub async fn is_member(&self, code: &GroupCode, member: &MemberId) -> Result<bool, GroupError> {
        Ok(self.load(code).await?.is_member(member))
    }

    /// The group's members minus `excluding`. May be empty.
    pub async fn other_members(
        &self,
        code: &GroupCode,
        excluding: &MemberId,
    ) -> Result<BTreeSet<MemberId>, GroupError> {
        let group = self.load(code).await?;
        Ok(group.others(excluding).map(|(id, _)| id.clone()).collect())
    }

    /// Resolve an initiation in one read: whether `sender` is a member, and
    /// every other member with its push token.
    ///
    /// Returns `Ok(None)` when `sender` is not a member.
    pub async fn recipients_for(
        &self,
        code: &GroupCode,
        sender: &MemberId,
    ) -> Result<Option<Vec<Recipient>>, GroupError> {
        let group = self.load(code).await?;
        if !group.is_member(sender) {
            return Ok(None);
        }
        Ok(Some(
            group
                .others(sender)
                .map(|(member, info)| Recipient {
                    member: member.clone(),
                    push_token: info.push_token.clone(),
                })
                .collect(),
        ))
    }

    /// Current push token of `member`, `Ok(None)` if it is no longer a member.
    pub async fn push_token(
        &self,
        code: &GroupCode,
        member: &MemberId,
    ) -> Result<Option<PushToken>, GroupError> {
        Ok(self
            .load(code)
            .await?
            .members
            .get(member)
            .map(|info| info.push_token.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGroupStore;
    use crate::store::GroupDirectory;

    fn member(id: &str) -> MemberId {
        MemberId::new(id).unwrap()
    }

    fn token(t: &str) -> PushToken {
        PushToken::new(t).unwrap()
    }

    async fn household() -> (Arc<MemoryGroupStore>, GroupCode) {
        let store = Arc::new(MemoryGroupStore::new());
        let group = store
            .create_group("home", member("a"), token("tok-a"), None)
            .await
            .unwrap();
        for m in ["b", "c"] {
            store
                .upsert_member(&group.code, member(m), token(&format!("tok-{m}")), None)
                .await
                .unwrap();
        }
        (store, group.code)
    }

    #[tokio::test]
    async fn is_member_reflects_store() {
        let (store, code) = household().await;
        let resolver = MembershipResolver::new(store.clone());
        assert!(resolver.is_member(&code, &member("b")).await.unwrap());
        assert!(!resolver.is_member(&code, &member("z")).await.unwrap());

        store.remove_member(&code, &member("b")).await.unwrap();
        assert!(!resolver.is_member(&code, &member("b")).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_group_is_not_found() {
        let resolver = MembershipResolver::new(Arc::new(MemoryGroupStore::new()));
        let code = GroupCode::parse("GHOST1").unwrap();
        assert!(matches!(
            resolver.is_member(&code, &member("a")).await,
            Err(GroupError::GroupNotFound(_))
        ));
        assert!(matches!(
            resolver.other_members(&code, &member("a")).await,
            Err(GroupError::GroupNotFound(_))
        ));
    }

    #[tokio::test]
    async fn other_members_excludes_caller() {
        let (store, code) = household().await;
        let resolver = MembershipResolver::new(store);
        let others = resolver.other_members(&code, &member("a")).await.unwrap();
        assert_eq!(others, BTreeSet::from([member("b"), member("c")]));
    }

    #[tokio::test]
    async fn recipients_carry_tokens() {
        let (store, code) = household().await;
        let resolver = MembershipResolver::new(store);
        let recipients = resolver
            .recipients_for(&code, &member("b"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            recipients,
            vec![
                Recipient { member: member("a"), push_token: token("tok-a") },
                Recipient { member: member("c"), push_token: token("tok-c") },
            ]
        );
    }

    #[tokio::test]
    async fn recipients_for_non_member_is_none() {
        let (store, code) = household().await;
        let resolver = MembershipResolver::new(store);
        assert!(resolver.recipients_for(&code, &member("z")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn push_token_tracks_latest_write() {
        let (store, code) = household().await;
        let resolver = MembershipResolver::new(store.clone());
        store
            .upsert_member(&code, member("b"), token("tok-b2"), None)
            .await
            .unwrap();
        assert_eq!(
            resolver.push_token(&code, &member("b")).await.unwrap(),
            Some(token("tok-b2"))
        );
        store.remove_member(&code, &member("b")).await.unwrap();
        assert_eq!(resolver.push_token(&code, &member("b")).await.unwrap(), None);
    }
}
