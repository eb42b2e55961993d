use serde::{Deserialize, Serialize};
use surrealdb::{RecordId, sql::Datetime};

/// Persisted representation of a user in SurrealDB (table: `user`).
///
/// The record is created by the login/linking flow; the gate only reads it
/// and conditionally updates the delegated-credential fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable database identifier for this user.
    pub id: RecordId,
    /// Subject claim of the bearer credential this user authenticates with.
    pub subject: String,
    /// Optional email for display.
    pub email: Option<String>,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Delegated access token for the upstream resource provider, if linked.
    pub delegated_access_token: Option<String>,
    /// Refresh token for the upstream provider, if linked.
    pub delegated_refresh_token: Option<String>,
    /// When the delegated access token expires. Absence means the token's age
    /// is unknown and it must be treated as already expired.
    pub delegated_token_expires_at: Option<Datetime>,
    /// When this record was first created.
    pub created_at: Option<Datetime>,
    /// When this record was last updated.
    pub updated_at: Option<Datetime>,
}

/// Payload used when inserting a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    /// Subject claim this user authenticates with.
    pub subject: String,
    /// Optional email for display.
    pub email: Option<String>,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Initial delegated access token, set by the linking flow.
    pub delegated_access_token: Option<String>,
    /// Initial refresh token, set by the linking flow.
    pub delegated_refresh_token: Option<String>,
    /// Initial expiration of the delegated access token.
    pub delegated_token_expires_at: Option<Datetime>,
}

impl UserCreate {
    /// A user with no delegated credential linked yet.
    pub fn unlinked(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            display_name: None,
            delegated_access_token: None,
            delegated_refresh_token: None,
            delegated_token_expires_at: None,
        }
    }
}

/// Delegated-credential fields written after a successful upstream refresh.
///
/// All three fields are written together; a refresh never persists a partial
/// result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegatedTokenUpdate {
    /// New access token from the provider.
    pub access_token: String,
    /// New refresh token (providers rotate these).
    pub refresh_token: String,
    /// When the new access token expires.
    pub expires_at: Datetime,
}
