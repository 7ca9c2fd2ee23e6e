//! Push notification delivery.
//!
//! The knock protocol addresses exactly one device per send and treats each
//! delivery's failure independently, so the gateway contract is a single
//! `send(token, message)` call; fan-out happens in the caller.

pub mod error;
pub mod gateway;
pub mod http;
pub mod payload;

pub use error::PushError;
pub use gateway::{LogPushGateway, PushGateway};
pub use http::HttpPushGateway;
pub use payload::{attempt_message, confirmed_message};
