//! Cid: an opaque content identifier handed out by the IPFS daemon.
//!
//! The node never looks inside a CID. The only checks made on the way in
//! are the ones that keep it a single, well-formed argv element: not empty,
//! no whitespace or control characters, and no leading `-` that the daemon's
//! flag parser would pick up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A content identifier as returned by `ipfs add`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

/// Errors that can occur when parsing a CID.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CidError {
    #[error("empty cid")]
    Empty,

    #[error("invalid character {0:?} in cid")]
    InvalidChar(char),

    #[error("cid must not start with '-'")]
    LeadingDash,
}

impl Cid {
    /// Create from a string, validating that it is a single safe token.
    pub fn from_str_checked(s: &str) -> Result<Self, CidError> {
        if s.is_empty() {
            return Err(CidError::Empty);
        }
        if let Some(c) = s.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(CidError::InvalidChar(c));
        }
        if s.starts_with('-') {
            return Err(CidError::LeadingDash);
        }
        Ok(Self(s.to_string()))
    }

    /// Get the CID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Cid {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_checked(s)
    }
}

impl AsRef<str> for Cid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
