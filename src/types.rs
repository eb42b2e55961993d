//! NewType wrappers for the credential strings flowing through the gate.
//!
//! These types prevent accidental mixing of semantically different strings
//! (e.g., passing a refresh token where a delegated access token is expected).
//! The two token types redact their contents from `Debug` output so they never
//! leak into logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subject (identity id) claim of a verified bearer credential.
///
/// This is the key used for user-record lookup and for the per-identity
/// refresh coordination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Create a new subject id.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the inner value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SubjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Delegated access token issued by the upstream provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the inner value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print token material
        write!(f, "AccessToken(..)")
    }
}

/// Long-lived refresh token exchanged for new access tokens.
///
/// Providers commonly rotate these on every use, so a stored value may be
/// single-use.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Create an empty refresh token.
    ///
    /// Used when a record has no stored refresh token; the upstream endpoint
    /// is expected to reject it.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Get the inner value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this token carries no material.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print token material
        write!(f, "RefreshToken(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_id_roundtrip() {
        let id = SubjectId::new("user-42");
        assert_eq!(id.as_str(), "user-42");
        assert_eq!(id.to_string(), "user-42");
        assert_eq!(SubjectId::from("user-42"), id);
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let access = AccessToken::new("super-secret");
        let refresh = RefreshToken::new("even-more-secret");
        assert_eq!(format!("{:?}", access), "AccessToken(..)");
        assert_eq!(format!("{:?}", refresh), "RefreshToken(..)");
    }

    #[test]
    fn test_refresh_token_empty() {
        let empty = RefreshToken::empty();
        assert!(empty.is_empty());
        assert!(!RefreshToken::new("x").is_empty());
    }
}
