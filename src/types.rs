//! Basic type definitions for the chat relay
//!
//! Provides newtype wrappers for type safety:
//! - `SessionId`: UUID-based identity of one accepted connection
//! - `Username`: a handshake name that passed validation

use uuid::Uuid;

use crate::error::AppError;

/// Unique session identifier (newtype pattern)
///
/// Wraps a UUID v4. This is the registry key; usernames are not
/// required to be unique, so they cannot serve as identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated username
///
/// Non-empty, ASCII letters, digits and underscore only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate a handshake line
    ///
    /// The line is taken as-is: surrounding whitespace is not stripped,
    /// so `" alice"` is rejected.
    pub fn parse(candidate: &str) -> Result<Self, AppError> {
        if is_valid_username(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(AppError::InvalidUsername(candidate.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `[A-Za-z0-9_]+`
pub fn is_valid_username(candidate: &str) -> bool {
    !candidate.trim().is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
