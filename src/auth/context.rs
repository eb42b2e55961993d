//! Request-scoped context passed between the gate stages.

use crate::types::{AccessToken, SubjectId};

/// Identity extracted from a successfully verified bearer credential.
///
/// Inserted into the request extensions by the verification middleware and
/// read by everything downstream. Scoped to one request's lifetime.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    subject: SubjectId,
}

impl VerifiedIdentity {
    /// Create a new verified identity.
    pub fn new(subject: SubjectId) -> Self {
        Self { subject }
    }

    /// The subject claim of the verified credential.
    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }
}

/// Delegated access token made available to routes that require upstream
/// access. Inserted by the delegation middleware after the cached-or-refreshed
/// decision.
#[derive(Debug, Clone)]
pub struct DelegatedAccess {
    token: AccessToken,
}

impl DelegatedAccess {
    /// Create a new delegated-access value.
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }

    /// The delegated access token, valid for immediate upstream use.
    pub fn token(&self) -> &AccessToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_carries_subject() {
        let identity = VerifiedIdentity::new(SubjectId::new("user-1"));
        assert_eq!(identity.subject().as_str(), "user-1");
    }

    #[test]
    fn test_delegated_access_carries_token() {
        let access = DelegatedAccess::new(AccessToken::new("tok"));
        assert_eq!(access.token().as_str(), "tok");
    }
}
