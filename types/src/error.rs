//! Errors raised while constructing protocol identifiers.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("member id must not be empty")]
    EmptyMemberId,

    #[error("push token must not be empty")]
    EmptyPushToken,

    #[error("invalid group code: {0}")]
    InvalidGroupCode(String),

    #[error("invalid knock id: {0}")]
    InvalidKnockId(String),
}
