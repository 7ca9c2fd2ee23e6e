//! Nullable infrastructure for deterministic testing.
//!
//! External collaborators are abstracted behind traits. This crate provides
//! test-friendly implementations that:
//! - Record everything they are asked to do
//! - Can be told to fail or slow down programmatically
//! - Never touch the network
//!
//! Group documents need no nullable: `knock_groups::MemoryGroupStore` already
//! is one.

pub mod push;

pub use push::{NullPushGateway, SentPush};
