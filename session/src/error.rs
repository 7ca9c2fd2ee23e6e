use knock_groups::GroupError;
use knock_types::{GroupCode, KnockId};
use thiserror::Error;

/// What a [`KnockError::NotFound`] refers to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Missing {
    #[error("group {0}")]
    Group(GroupCode),

    /// Never existed or already expired; the two are indistinguishable.
    #[error("knock {0}")]
    Knock(KnockId),
}

#[derive(Debug, Error)]
pub enum KnockError {
    #[error("{0} not found")]
    NotFound(Missing),

    #[error("not a member of group {0}")]
    NotMember(GroupCode),

    #[error("group {0} has no other members to notify")]
    NoRecipients(GroupCode),

    /// Reported alongside a successful initiation, never returned as `Err`
    /// from it.
    #[error("{failed} of {attempted} knock-attempt deliveries failed")]
    DeliveryPartialFailure { failed: usize, attempted: usize },

    #[error("group store error: {0}")]
    Store(GroupError),
}

impl From<GroupError> for KnockError {
    fn from(e: GroupError) -> Self {
        match e {
            GroupError::GroupNotFound(code) => KnockError::NotFound(Missing::Group(code)),
            other => KnockError::Store(other),
        }
    }
}
