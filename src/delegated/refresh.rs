//! Upstream token refresh.
//!
//! The provider's token endpoint is a black box behind the [`TokenRefresher`]
//! trait; the HTTP implementation speaks the standard
//! `grant_type=refresh_token` exchange. Tests substitute their own
//! implementations to observe (or fail) refresh calls.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::config::RefreshConfig;
use crate::types::{AccessToken, RefreshToken};

/// Failures of the upstream refresh call.
#[derive(Debug, Clone)]
pub enum RefreshError {
    /// Network-level failure, including the call exceeding its timeout.
    Transport(String),
    /// The endpoint answered with a non-success status (invalid, revoked or
    /// expired refresh token, provider outage).
    Endpoint(u16),
    /// The endpoint answered 2xx but the body was not a token response.
    MalformedResponse(String),
}

impl std::fmt::Display for RefreshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(reason) => write!(f, "transport error: {}", reason),
            Self::Endpoint(status) => write!(f, "token endpoint returned status {}", status),
            Self::MalformedResponse(reason) => write!(f, "malformed token response: {}", reason),
        }
    }
}

impl std::error::Error for RefreshError {}

/// Token triple returned by a successful refresh.
///
/// Persisted into the user record as a unit, discarded entirely on failure.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    /// Fresh delegated access token.
    pub access_token: AccessToken,
    /// Rotated refresh token to store for the next refresh.
    pub refresh_token: RefreshToken,
    /// When the fresh access token expires.
    pub expires_at: DateTime<Utc>,
}

/// Black-box refresh operation against the upstream provider.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange the stored refresh token for a fresh token triple.
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshedTokens, RefreshError>;
}

/// Wire format of the standard OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    /// Providers that rotate refresh tokens return a new one; those that
    /// don't omit the field and the current token stays valid.
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

/// `TokenRefresher` over the provider's HTTP token endpoint.
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    config: RefreshConfig,
}

impl HttpTokenRefresher {
    /// Build a refresher; the whole-call timeout comes from the config.
    pub fn new(config: RefreshConfig) -> Result<Self, RefreshError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<RefreshedTokens, RefreshError> {
        let response = self
            .client
            .post(self.config.token_url.clone())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
            ])
            .send()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Endpoint(status.as_u16()));
        }

        let body: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|err| RefreshError::MalformedResponse(err.to_string()))?;

        // A provider that does not rotate keeps the presented token valid
        let rotated = match body.refresh_token {
            Some(token) => RefreshToken::new(token),
            None => refresh_token.clone(),
        };

        Ok(RefreshedTokens {
            access_token: AccessToken::new(body.access_token),
            refresh_token: rotated,
            expires_at: Utc::now() + Duration::seconds(body.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_with_rotation() {
        let body: TokenEndpointResponse = serde_json::from_str(
            r#"{"access_token": "a1", "refresh_token": "r1", "expires_in": 3600}"#,
        )
        .unwrap();
        assert_eq!(body.access_token, "a1");
        assert_eq!(body.refresh_token, Some("r1".to_string()));
        assert_eq!(body.expires_in, 3600);
    }

    #[test]
    fn test_token_response_without_rotation() {
        let body: TokenEndpointResponse =
            serde_json::from_str(r#"{"access_token": "a1", "expires_in": 60}"#).unwrap();
        assert!(body.refresh_token.is_none());
    }

    #[test]
    fn test_token_response_missing_access_token_is_rejected() {
        let body = serde_json::from_str::<TokenEndpointResponse>(r#"{"expires_in": 60}"#);
        assert!(body.is_err());
    }

    #[test]
    fn test_refresh_error_display() {
        assert_eq!(
            RefreshError::Endpoint(502).to_string(),
            "token endpoint returned status 502"
        );
        assert!(
            RefreshError::Transport("timed out".to_string())
                .to_string()
                .contains("timed out")
        );
    }
}
