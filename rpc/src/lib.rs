//! HTTP API for the knock service.
//!
//! Provides endpoints for:
//! - Group management (create, join, leave)
//! - Knock initiation and address reports
//! - Health and Prometheus metrics
//!
//! Client addresses are observed from the request itself (see [`address`]),
//! never taken from the body.

pub mod address;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use error::RpcError;
pub use metrics::KnockMetrics;
pub use server::{AppState, RpcServer};
