//! Delegated-credential lifecycle.
//!
//! Given a verified identity, loads the stored delegated credential, checks
//! expiration and either serves the cached access token or refreshes it
//! against the upstream provider. The single refresh path is the only place
//! in the gate with external effects: one outbound call to the token
//! endpoint, one persisted-record update.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use surrealdb::sql::Datetime;
use tracing::{debug, warn};

use crate::auth::{AuthError, DelegatedTokenStore, VerifiedIdentity};
use crate::db::schema::{DelegatedTokenUpdate, UserRecord};
use crate::delegated::flight::FlightGuards;
use crate::delegated::refresh::{RefreshedTokens, TokenRefresher};
use crate::types::{AccessToken, RefreshToken};

/// How many times a successful refresh result is re-offered to the store
/// before the refresh is reported failed. A provider that rotates refresh
/// tokens has already invalidated the old one by this point, so giving up on
/// the first write error would strand the new credential.
const PERSIST_ATTEMPTS: u32 = 3;
/// Pause between persistence attempts.
const PERSIST_BACKOFF_MS: u64 = 50;

/// Stateful half of the gate: delegated-credential lookup, expiration and
/// refresh.
pub struct DelegatedCredentialProvider {
    store: Arc<dyn DelegatedTokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    flights: FlightGuards,
}

impl DelegatedCredentialProvider {
    /// Create a provider over the given store and refresh operation.
    pub fn new(store: Arc<dyn DelegatedTokenStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            store,
            refresher,
            flights: FlightGuards::new(),
        }
    }

    /// Ensure a delegated access token valid for immediate use.
    ///
    /// Serves the cached token when it is present and unexpired; otherwise
    /// performs one upstream refresh per identity (concurrent requests for
    /// the same identity collapse onto it) and persists the result. On
    /// refresh failure the stored record keeps its last-known-good state so a
    /// later request can retry.
    pub async fn ensure_delegated_access(
        &self,
        identity: &VerifiedIdentity,
    ) -> Result<AccessToken, AuthError> {
        let record = self.load_record(identity).await?;

        let cached = record
            .delegated_access_token
            .as_deref()
            .ok_or(AuthError::DelegationMissing)?;

        if !is_expired(record.delegated_token_expires_at.as_ref(), Utc::now()) {
            return Ok(AccessToken::new(cached));
        }

        self.refresh_for(identity).await
    }

    /// Expired path. Holds the per-identity guard for the whole
    /// read-refresh-write cycle.
    async fn refresh_for(&self, identity: &VerifiedIdentity) -> Result<AccessToken, AuthError> {
        let _flight = self.flights.acquire(identity.subject().as_str()).await;

        // Re-read under the guard: a request queued behind a finished refresh
        // finds the record fresh and must not trigger a second upstream call.
        let record = self.load_record(identity).await?;
        let cached = record
            .delegated_access_token
            .clone()
            .ok_or(AuthError::DelegationMissing)?;

        if !is_expired(record.delegated_token_expires_at.as_ref(), Utc::now()) {
            debug!(
                subject = %identity.subject(),
                "delegated credential already refreshed by a concurrent request"
            );
            return Ok(AccessToken::new(cached));
        }

        // Empty if never stored; the endpoint is expected to reject it
        let current_refresh = record
            .delegated_refresh_token
            .clone()
            .map(RefreshToken::new)
            .unwrap_or_else(RefreshToken::empty);

        let refreshed = self
            .refresher
            .refresh(&current_refresh)
            .await
            .map_err(|err| {
                warn!(
                    subject = %identity.subject(),
                    error = %err,
                    "upstream token refresh failed"
                );
                AuthError::RefreshFailed(err.to_string())
            })?;

        self.persist_refreshed(identity, &refreshed).await?;

        debug!(subject = %identity.subject(), "delegated credential refreshed");
        Ok(refreshed.access_token)
    }

    async fn load_record(&self, identity: &VerifiedIdentity) -> Result<UserRecord, AuthError> {
        self.store
            .find_by_subject(identity.subject())
            .await
            .map_err(|err| AuthError::Store(err.to_string()))?
            .ok_or(AuthError::IdentityNotFound)
    }

    /// Write the refreshed triple, retrying a bounded number of times.
    ///
    /// The provider may already have invalidated the refresh token we just
    /// consumed, so losing this write loses the credential; a write that
    /// still fails after the retries surfaces as a refresh failure.
    async fn persist_refreshed(
        &self,
        identity: &VerifiedIdentity,
        refreshed: &RefreshedTokens,
    ) -> Result<(), AuthError> {
        let update = DelegatedTokenUpdate {
            access_token: refreshed.access_token.as_str().to_string(),
            refresh_token: refreshed.refresh_token.as_str().to_string(),
            expires_at: Datetime::from(refreshed.expires_at),
        };

        let mut last_error = None;
        for attempt in 1..=PERSIST_ATTEMPTS {
            match self
                .store
                .update_delegated_tokens(identity.subject(), &update)
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(
                        subject = %identity.subject(),
                        attempt,
                        error = %err,
                        "failed to persist refreshed delegated credential"
                    );
                    last_error = Some(err);
                    if attempt < PERSIST_ATTEMPTS {
                        tokio::time::sleep(std::time::Duration::from_millis(PERSIST_BACKOFF_MS))
                            .await;
                    }
                }
            }
        }

        let reason = last_error
            .map(|err| err.to_string())
            .unwrap_or_else(|| "persistence failed".to_string());
        Err(AuthError::RefreshFailed(reason))
    }
}

/// A delegated credential with no recorded expiration is of unknown age and
/// treated as already expired; otherwise expiry is at-or-before now.
fn is_expired(expires_at: Option<&Datetime>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(at) => **at <= now,
        None => true,
    }
}
