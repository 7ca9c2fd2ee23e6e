use thiserror::Error;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push gateway unreachable: {0}")]
    Unreachable(String),

    #[error("push request failed: {0}")]
    RequestFailed(String),

    #[error("push rejected by gateway: {0}")]
    Rejected(String),

    #[error("invalid response from push gateway: {0}")]
    InvalidResponse(String),
}
