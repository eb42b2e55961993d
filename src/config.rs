//! Gate configuration.
//!
//! Both middleware stages receive explicitly constructed configuration values
//! at startup. Nothing reads ambient globals at request time, which keeps
//! tests deterministic: each test case builds its own config.

use anyhow::Result;
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

/// Where the raw bearer credential is sourced from.
///
/// This only selects the extraction function; validation is identical for
/// both sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// `Authorization` header (the default deployment mode).
    Header,
    /// Named cookie holding the same `<scheme> <token>` string.
    Cookie,
}

/// Configuration for the stateless verification stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret the bearer credential is signed with.
    pub secret: String,
    /// Expected `iss` claim; tokens from any other issuer are rejected.
    pub issuer: String,
    /// The single accepted signing algorithm. Never negotiated per request.
    pub algorithm: Algorithm,
    /// Where the raw credential is read from.
    pub credential_source: CredentialSource,
    /// Cookie name used when `credential_source` is [`CredentialSource::Cookie`].
    pub cookie_name: String,
}

impl AuthConfig {
    /// Create a header-sourced HS256 config.
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            algorithm: Algorithm::HS256,
            credential_source: CredentialSource::Header,
            cookie_name: default_cookie_name(),
        }
    }

    /// Switch to cookie-sourced credentials.
    pub fn with_cookie(mut self, cookie_name: impl Into<String>) -> Self {
        self.credential_source = CredentialSource::Cookie;
        self.cookie_name = cookie_name.into();
        self
    }

    /// Load from environment variables.
    ///
    /// `AUTHGATE_JWT_SECRET` and `AUTHGATE_JWT_ISSUER` are required;
    /// `AUTHGATE_CREDENTIAL_SOURCE` (`header` | `cookie`) and
    /// `AUTHGATE_AUTH_COOKIE` are optional.
    pub fn from_env() -> Result<Self> {
        let secret = env::var("AUTHGATE_JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("AUTHGATE_JWT_SECRET is not set"))?;
        let issuer = env::var("AUTHGATE_JWT_ISSUER")
            .map_err(|_| anyhow::anyhow!("AUTHGATE_JWT_ISSUER is not set"))?;

        let mut config = Self::new(secret, issuer);

        match env::var("AUTHGATE_CREDENTIAL_SOURCE").as_deref() {
            Ok("cookie") => {
                let name =
                    env::var("AUTHGATE_AUTH_COOKIE").unwrap_or_else(|_| default_cookie_name());
                config = config.with_cookie(name);
            }
            Ok("header") | Err(_) => {}
            Ok(other) => {
                return Err(anyhow::anyhow!(
                    "AUTHGATE_CREDENTIAL_SOURCE must be `header` or `cookie`, got `{}`",
                    other
                ));
            }
        }

        Ok(config)
    }
}

fn default_cookie_name() -> String {
    "authgate_token".to_string()
}

/// Configuration for the upstream token-refresh call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// OAuth token endpoint of the upstream provider.
    pub token_url: Url,
    /// Client id registered with the provider.
    pub client_id: String,
    /// Client secret registered with the provider.
    pub client_secret: String,
    /// Whole-call timeout; a refresh exceeding it surfaces as a refresh
    /// failure instead of hanging the pipeline.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl RefreshConfig {
    /// Create a refresh config with the default timeout.
    pub fn new(
        token_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout: Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECONDS),
        }
    }

    /// Override the refresh-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load from `AUTHGATE_TOKEN_URL`, `AUTHGATE_CLIENT_ID`,
    /// `AUTHGATE_CLIENT_SECRET` and optional `AUTHGATE_REFRESH_TIMEOUT_SECONDS`.
    pub fn from_env() -> Result<Self> {
        let token_url = env::var("AUTHGATE_TOKEN_URL")
            .map_err(|_| anyhow::anyhow!("AUTHGATE_TOKEN_URL is not set"))?;
        let token_url = Url::parse(&token_url)?;
        let client_id = env::var("AUTHGATE_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("AUTHGATE_CLIENT_ID is not set"))?;
        let client_secret = env::var("AUTHGATE_CLIENT_SECRET")
            .map_err(|_| anyhow::anyhow!("AUTHGATE_CLIENT_SECRET is not set"))?;

        let mut config = Self::new(token_url, client_id, client_secret);
        if let Ok(secs) = env::var("AUTHGATE_REFRESH_TIMEOUT_SECONDS") {
            config.timeout = Duration::from_secs(secs.parse()?);
        }

        Ok(config)
    }
}

/// Default upstream refresh timeout in seconds.
pub const DEFAULT_REFRESH_TIMEOUT_SECONDS: u64 = 10;

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
