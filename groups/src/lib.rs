//! Group membership layer.
//!
//! Groups are named sets of members sharing knock eligibility. They live in an
//! external document store; this crate only reads them on the knock path.
//!
//! Design:
//! - [`GroupStore`] is the read contract (`get_group`) every backend provides.
//! - [`GroupDirectory`] adds the writes used by the create/join/leave surface.
//!   The knock protocol never writes through it.
//! - [`MembershipResolver`] answers "is X a member of G" and "who else is in G"
//!   straight from the store, with no caching, so the latest write always wins.
//! - [`MemoryGroupStore`] is the bundled in-process backend; [`HttpGroupStore`]
//!   reads group documents from a remote service.

pub mod client;
pub mod error;
pub mod memory;
pub mod resolver;
pub mod store;
pub mod types;

pub use client::HttpGroupStore;
pub use error::GroupError;
pub use memory::MemoryGroupStore;
pub use resolver::{MembershipResolver, Recipient};
pub use store::{GroupDirectory, GroupStore};
pub use types::{Group, MemberInfo};
