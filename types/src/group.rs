//! Group codes.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// Short human-shareable code identifying a group.
///
/// Codes are case-insensitive on input and always stored upper case.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupCode(String);

impl GroupCode {
    /// Length of generated codes.
    pub const LEN: usize = 6;

    const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Parse a user-supplied code, normalising it to upper case.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TypesError::InvalidGroupCode(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Generate a fresh random code of [`GroupCode::LEN`] characters.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..Self::LEN)
            .map(|_| Self::ALPHABET[rng.gen_range(0..Self::ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for GroupCode {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<GroupCode> for String {
    fn from(code: GroupCode) -> Self {
        code.0
    }
}
