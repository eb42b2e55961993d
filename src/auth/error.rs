//! Error taxonomy for the authentication gate.
//!
//! Every verification sub-failure (bad signature, wrong issuer, wrong
//! algorithm, expired, not yet valid) collapses into
//! [`AuthError::InvalidCredential`] so responses never reveal which check a
//! forged token failed.

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use std::fmt;

/// Errors produced by the two gate stages.
///
/// Each request receives exactly one terminal response; the axum layer maps
/// these variants through [`IntoResponse`].
#[derive(Debug, Clone)]
pub enum AuthError {
    /// Credential missing or not in `<scheme> <token>` form.
    MalformedCredential,
    /// Signature, issuer, algorithm, expiration or not-before check failed.
    InvalidCredential,
    /// The verified subject has no durable user record (e.g. account deleted
    /// after the token was issued).
    IdentityNotFound,
    /// The user record exists but was never linked to the upstream provider.
    DelegationMissing,
    /// The upstream refresh call or the persistence of its result failed.
    /// Transient; the stored record keeps its last-known-good state.
    RefreshFailed(String),
    /// The user store itself failed during lookup.
    Store(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedCredential => write!(f, "malformed credential"),
            Self::InvalidCredential => write!(f, "invalid credential"),
            Self::IdentityNotFound => write!(f, "user not recognized"),
            Self::DelegationMissing => write!(f, "delegated credential required"),
            Self::RefreshFailed(reason) => write!(f, "delegated refresh failed: {}", reason),
            Self::Store(reason) => write!(f, "user store error: {}", reason),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, reason) = match &self {
            // All authentication failures look alike to the caller.
            Self::MalformedCredential | Self::InvalidCredential => {
                (StatusCode::UNAUTHORIZED, "Unauthorized.")
            }
            Self::IdentityNotFound => (StatusCode::UNAUTHORIZED, "User not recognized."),
            Self::DelegationMissing => {
                (StatusCode::UNAUTHORIZED, "Delegated credential required.")
            }
            Self::RefreshFailed(_) => (
                StatusCode::BAD_REQUEST,
                "Unable to refresh delegated credential.",
            ),
            Self::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error."),
        };

        (status, reason).into_response()
    }
}
