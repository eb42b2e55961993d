//! Bearer-credential verification and request identity.
//!
//! This module is the stateless half of the gate: it turns a raw
//! `Authorization` header (or a named cookie, depending on deployment mode)
//! into a [`VerifiedIdentity`] attached to the request, rejecting anything
//! that fails a structural or trust check.
//!
//! ## Security model
//!
//! - One secret, one algorithm, one issuer — none of it negotiated per request
//! - Zero clock-skew tolerance: expiration and not-before are enforced exactly
//! - All trust failures collapse into a single `401` so a forger learns
//!   nothing about which check tripped

mod context;
mod error;
pub mod extract;
pub mod middleware;
mod user_store;
mod verifier;

pub use context::{DelegatedAccess, VerifiedIdentity};
pub use error::AuthError;
pub use user_store::{DelegatedTokenStore, UserStore};
pub use verifier::{Claims, LEEWAY_SECONDS, TokenVerifier};
