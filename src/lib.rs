// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod delegated;
pub mod server;
pub mod types;


// Re-export key types and functions
pub use auth::{
    AuthError, DelegatedAccess, DelegatedTokenStore, TokenVerifier, UserStore, VerifiedIdentity,
};
pub use config::{AuthConfig, CredentialSource, RefreshConfig};
pub use db::{DatabaseConfig, create_connection, ensure_schema};
pub use delegated::{
    DelegatedCredentialProvider, HttpTokenRefresher, RefreshError, RefreshedTokens, TokenRefresher,
};
pub use server::{AppState, build_router, serve};
pub use types::{AccessToken, RefreshToken, SubjectId};

use std::sync::Arc;

use anyhow::Result;

/// Convenience function to assemble a fully configured gate.
///
/// Connects to the database, applies the schema, builds the HTTP refresher
/// from the refresh config and returns ready-to-serve state.
pub async fn create_gate(
    auth_config: AuthConfig,
    refresh_config: RefreshConfig,
    db_config: DatabaseConfig,
) -> Result<AppState> {
    let db = create_connection(db_config).await?;
    ensure_schema(&db).await?;

    let refresher = HttpTokenRefresher::new(refresh_config)
        .map_err(|err| anyhow::anyhow!("failed to build token refresher: {}", err))?;

    Ok(AppState::new(auth_config, db, Arc::new(refresher)))
}
