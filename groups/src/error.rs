use knock_types::GroupCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group {0} not found")]
    GroupNotFound(GroupCode),

    #[error("group {0} already exists")]
    AlreadyExists(GroupCode),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP request to group store failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from group store: {0}")]
    InvalidResponse(String),

    #[error("group store unreachable: {0}")]
    Unreachable(String),
}
