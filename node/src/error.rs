use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("RPC server error: {0}")]
    Rpc(#[from] knock_rpc::RpcError),

    #[error("node already started")]
    AlreadyStarted,

    #[error("node has been stopped")]
    Stopped,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
