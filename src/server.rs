//! HTTP wiring for the gate.
//!
//! Composes the two middleware stages into a router. Routes under the
//! identity layer see a [`VerifiedIdentity`] extension; routes additionally
//! under the delegation layer see a [`DelegatedAccess`] extension.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Extension, Json, Router,
    middleware::from_fn_with_state,
    routing::get,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::middleware::{require_delegated_access, require_identity};
use crate::auth::{DelegatedAccess, TokenVerifier, UserStore, VerifiedIdentity};
use crate::config::AuthConfig;
use crate::db::Db;
use crate::delegated::{DelegatedCredentialProvider, TokenRefresher};

/// Shared state injected into the middleware stages.
#[derive(Clone)]
pub struct AppState {
    pub auth_config: Arc<AuthConfig>,
    pub verifier: Arc<TokenVerifier>,
    pub delegated: Arc<DelegatedCredentialProvider>,
}

impl AppState {
    /// Assemble the gate state from its collaborators.
    pub fn new(auth_config: AuthConfig, db: Db, refresher: Arc<dyn TokenRefresher>) -> Self {
        let verifier = TokenVerifier::new(&auth_config);
        let store = UserStore::new(db);
        let delegated = DelegatedCredentialProvider::new(Arc::new(store), refresher);

        Self {
            auth_config: Arc::new(auth_config),
            verifier: Arc::new(verifier),
            delegated: Arc::new(delegated),
        }
    }
}

/// Build the gate router.
///
/// `/whoami` sits behind the verification stage only; `/whoami/delegated`
/// sits behind both stages and demonstrates the downstream contract
/// (identity id plus delegated access token). `/healthz` is open.
pub fn build_router(state: AppState) -> Router {
    let delegated = Router::new()
        .route("/whoami/delegated", get(whoami_delegated))
        .layer(from_fn_with_state(state.clone(), require_delegated_access));

    let authenticated = Router::new()
        .route("/whoami", get(whoami))
        .merge(delegated)
        .layer(from_fn_with_state(state.clone(), require_identity));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the gate on the given bind address.
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;

    info!("authentication gate listening on http://{}", bind);

    axum::serve(listener, router).await?;

    Ok(())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn whoami(Extension(identity): Extension<VerifiedIdentity>) -> Json<serde_json::Value> {
    Json(json!({ "subject": identity.subject().as_str() }))
}

async fn whoami_delegated(
    Extension(identity): Extension<VerifiedIdentity>,
    Extension(access): Extension<DelegatedAccess>,
) -> Json<serde_json::Value> {
    Json(json!({
        "subject": identity.subject().as_str(),
        "delegated_access_token": access.token().as_str(),
    }))
}
