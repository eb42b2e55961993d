//! The two gate stages as axum middleware.
//!
//! Pipeline: client request → [`require_identity`] → (on success)
//! [`require_delegated_access`] → downstream handler. Each stage may
//! short-circuit with a terminal error response; data only flows forward via
//! request extensions.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::auth::context::{DelegatedAccess, VerifiedIdentity};
use crate::auth::error::AuthError;
use crate::auth::extract;
use crate::server::AppState;

/// Verification stage: extract the raw credential from the configured source,
/// verify it, and attach the identity to the request.
pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let raw = extract::raw_credential(&state.auth_config, req.headers())
        .ok_or(AuthError::MalformedCredential)?;

    let identity = state.verifier.verify(&raw)?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Delegation stage: ensure a usable upstream access token for the identity
/// attached by [`require_identity`], refreshing it if expired.
pub async fn require_delegated_access(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    // Stage ordering invariant: this layer only runs behind require_identity.
    let identity = req
        .extensions()
        .get::<VerifiedIdentity>()
        .cloned()
        .ok_or(AuthError::InvalidCredential)?;

    let token = state.delegated.ensure_delegated_access(&identity).await?;

    req.extensions_mut().insert(DelegatedAccess::new(token));
    Ok(next.run(req).await)
}
