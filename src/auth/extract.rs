//! Credential extraction from the inbound request.
//!
//! The deployment mode only changes *where* the raw credential string comes
//! from (header or named cookie), never how it is validated. Both paths
//! produce the same `<scheme> <token>` string for the verifier.

use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE};

use crate::config::{AuthConfig, CredentialSource};

/// Pull the raw credential string out of the request headers according to the
/// configured source. Returns `None` when the source is absent; shape
/// validation happens in the verifier.
pub fn raw_credential(config: &AuthConfig, headers: &HeaderMap) -> Option<String> {
    match config.credential_source {
        CredentialSource::Header => headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string()),
        CredentialSource::Cookie => cookie_value(headers, &config.cookie_name),
    }
}

/// Find a cookie by name in the `Cookie` header.
///
/// Cookie values arrive percent-encoded (browsers and cookie jars encode the
/// space in `<scheme> <token>`), so the value is decoded before it reaches
/// the verifier.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;

    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix(name)
            && let Some(value) = value.strip_prefix('=')
        {
            return urlencoding::decode(value)
                .ok()
                .map(|value| value.into_owned());
        }
    }

    None
}
