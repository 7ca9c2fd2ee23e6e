//! Knock server node.
//!
//! The node owns the long-lived pieces of the service:
//! - The group store (in-process, or a remote document store)
//! - The push gateway used for both knock phases
//! - The in-memory knock session registry
//! - The HTTP API and its shutdown signal

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod shutdown;

pub use config::{NodeConfig, PushConfig};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::KnockNode;
pub use shutdown::ShutdownController;
