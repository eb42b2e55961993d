//! Stateless bearer-credential verification.
//!
//! One configured secret, one configured algorithm, zero clock-skew
//! tolerance. A stale or pre-issued token is rejected at the boundary rather
//! than tolerated; `exp == now` fails, it does not pass.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::debug;

use crate::auth::context::VerifiedIdentity;
use crate::auth::error::AuthError;
use crate::config::AuthConfig;
use crate::types::SubjectId;

/// Clock-skew tolerance granted during verification. Fixed at zero.
pub const LEEWAY_SECONDS: u64 = 0;

/// Claims carried by the bearer credential.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub nbf: Option<u64>,
    #[serde(default)]
    pub iat: Option<u64>,
}

/// Verifier for inbound bearer credentials.
///
/// Pure function of its input: no I/O, no side effects beyond the returned
/// identity.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    /// Build a verifier from the gate configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["iss", "sub", "exp"]);
        validation.leeway = LEEWAY_SECONDS;
        validation.validate_nbf = true;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Verify a raw credential of the form `<scheme> <token>`.
    ///
    /// The scheme is stripped, the token segment is verified against the
    /// configured secret, issuer and algorithm, and the subject claim becomes
    /// the request identity. Every trust failure collapses into
    /// [`AuthError::InvalidCredential`].
    pub fn verify(&self, raw: &str) -> Result<VerifiedIdentity, AuthError> {
        let token = strip_scheme(raw)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            tracing::warn!(error = %err, "bearer credential verification failed");
            AuthError::InvalidCredential
        })?;

        let claims = self.validate_strict(data.claims)?;

        debug!(subject = %claims.sub, "bearer credential verified");
        Ok(VerifiedIdentity::new(SubjectId::new(claims.sub)))
    }

    /// Boundary checks on top of `jsonwebtoken`'s validation.
    ///
    /// `jsonwebtoken` accepts a token at the exact expiration instant; with
    /// zero tolerance a token whose `exp` is at or before now must fail.
    fn validate_strict(&self, claims: Claims) -> Result<Claims, AuthError> {
        let now = Utc::now().timestamp();

        if claims.exp as i64 <= now {
            tracing::warn!("bearer credential expired at the verification boundary");
            return Err(AuthError::InvalidCredential);
        }

        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        Ok(claims)
    }
}

/// Split `<scheme> <token>` into its parts and return the token segment.
///
/// Exactly two whitespace-separated segments are required; anything else is a
/// malformed credential, never a panic.
fn strip_scheme(raw: &str) -> Result<&str, AuthError> {
    let mut parts = raw.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_scheme), Some(token), None) => Ok(token),
        _ => Err(AuthError::MalformedCredential),
    }
}
