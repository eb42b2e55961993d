//! User storage.

use anyhow::Result;
use async_trait::async_trait;

use crate::db::Db;
use crate::db::schema::{DelegatedTokenUpdate, UserCreate, UserRecord};
use crate::types::SubjectId;

/// Store operations the delegated-credential stage depends on.
///
/// [`UserStore`] is the production implementation; tests substitute their own
/// to script lookup and persistence outcomes.
#[async_trait]
pub trait DelegatedTokenStore: Send + Sync {
    /// Load the record for a verified subject.
    async fn find_by_subject(&self, subject: &SubjectId) -> Result<Option<UserRecord>>;

    /// Persist the refreshed token triple.
    async fn update_delegated_tokens(
        &self,
        subject: &SubjectId,
        update: &DelegatedTokenUpdate,
    ) -> Result<()>;
}

/// User store for database operations.
///
/// Lookups are keyed by the subject claim of the verified bearer credential.
#[derive(Clone)]
pub struct UserStore {
    db: Db,
}

impl UserStore {
    /// Create a new user store.
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Find a user by the subject claim of their bearer credential.
    pub async fn find_by_subject(&self, subject: &SubjectId) -> Result<Option<UserRecord>> {
        let subject = subject.as_str().to_string();

        let query = r#"
            SELECT * FROM user
            WHERE subject = $subject
            LIMIT 1
        "#;

        let mut res = self.db.query(query).bind(("subject", subject)).await?;

        let users: Vec<UserRecord> = res.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create a new user.
    ///
    /// Called by the account-linking flow and by seeding tooling; the request
    /// pipeline itself never creates users.
    pub async fn create_user(&self, create: &UserCreate) -> Result<UserRecord> {
        let query = r#"
            CREATE user CONTENT {
                subject: $subject,
                email: $email,
                display_name: $display_name,
                delegated_access_token: $new_access,
                delegated_refresh_token: $refresh,
                delegated_token_expires_at: $expires
            }
        "#;

        let mut res = self
            .db
            .query(query)
            .bind(("subject", create.subject.clone()))
            .bind(("email", create.email.clone()))
            .bind(("display_name", create.display_name.clone()))
            .bind(("new_access", create.delegated_access_token.clone()))
            .bind(("refresh", create.delegated_refresh_token.clone()))
            .bind(("expires", create.delegated_token_expires_at.clone()))
            .await?;

        let users: Vec<UserRecord> = res.take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Failed to create user"))
    }

    /// Persist the result of a successful upstream refresh.
    ///
    /// Writes the whole token triple as a unit; nothing else on the record is
    /// touched. Matching no record is an error: the caller is holding freshly
    /// rotated tokens, and a write that silently lands nowhere would lose
    /// them while reporting success.
    pub async fn update_delegated_tokens(
        &self,
        subject: &SubjectId,
        update: &DelegatedTokenUpdate,
    ) -> Result<()> {
        let subject_str = subject.as_str().to_string();

        let query = r#"
            UPDATE user SET
                delegated_access_token = $new_access,
                delegated_refresh_token = $refresh,
                delegated_token_expires_at = $expires,
                updated_at = time::now()
            WHERE subject = $subject
        "#;

        let mut res = self
            .db
            .query(query)
            .bind(("subject", subject_str))
            .bind(("new_access", update.access_token.clone()))
            .bind(("refresh", update.refresh_token.clone()))
            .bind(("expires", update.expires_at.clone()))
            .await?;

        let updated: Vec<UserRecord> = res.take(0)?;
        if updated.is_empty() {
            anyhow::bail!("no user record for subject {}", subject);
        }

        Ok(())
    }
}

#[async_trait]
impl DelegatedTokenStore for UserStore {
    async fn find_by_subject(&self, subject: &SubjectId) -> Result<Option<UserRecord>> {
        UserStore::find_by_subject(self, subject).await
    }

    async fn update_delegated_tokens(
        &self,
        subject: &SubjectId,
        update: &DelegatedTokenUpdate,
    ) -> Result<()> {
        UserStore::update_delegated_tokens(self, subject, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseConfig, create_connection, ensure_schema};
    use chrono::{Duration, Utc};
    use surrealdb::sql::Datetime;

    async fn setup_test_db() -> Db {
        let config = DatabaseConfig {
            url: "memory".to_string(),
            ..Default::default()
        };
        let db = create_connection(config).await.unwrap();
        ensure_schema(&db).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_create_and_find_by_subject() {
        let db = setup_test_db().await;
        let store = UserStore::new(db);

        let created = store
            .create_user(&UserCreate {
                email: Some("test@example.com".to_string()),
                display_name: Some("Test User".to_string()),
                ..UserCreate::unlinked("sub123")
            })
            .await
            .unwrap();

        assert_eq!(created.subject, "sub123");
        assert_eq!(created.email, Some("test@example.com".to_string()));
        assert!(created.delegated_access_token.is_none());

        let found = store
            .find_by_subject(&SubjectId::new("sub123"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_find_unknown_subject_is_none() {
        let db = setup_test_db().await;
        let store = UserStore::new(db);

        let found = store
            .find_by_subject(&SubjectId::new("missing"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_delegated_tokens() {
        let db = setup_test_db().await;
        let store = UserStore::new(db);

        store
            .create_user(&UserCreate::unlinked("sub123"))
            .await
            .unwrap();

        let expires = Datetime::from(Utc::now() + Duration::hours(1));
        store
            .update_delegated_tokens(
                &SubjectId::new("sub123"),
                &DelegatedTokenUpdate {
                    access_token: "new-access".to_string(),
                    refresh_token: "new-refresh".to_string(),
                    expires_at: expires.clone(),
                },
            )
            .await
            .unwrap();

        let user = store
            .find_by_subject(&SubjectId::new("sub123"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.delegated_access_token, Some("new-access".to_string()));
        assert_eq!(
            user.delegated_refresh_token,
            Some("new-refresh".to_string())
        );
        assert_eq!(user.delegated_token_expires_at, Some(expires));
    }

    #[tokio::test]
    async fn test_update_without_matching_record_is_an_error() {
        let db = setup_test_db().await;
        let store = UserStore::new(db);

        let result = store
            .update_delegated_tokens(
                &SubjectId::new("vanished"),
                &DelegatedTokenUpdate {
                    access_token: "new-access".to_string(),
                    refresh_token: "new-refresh".to_string(),
                    expires_at: Datetime::from(Utc::now() + Duration::hours(1)),
                },
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_subject_rejected() {
        let db = setup_test_db().await;
        let store = UserStore::new(db);

        store
            .create_user(&UserCreate::unlinked("sub123"))
            .await
            .unwrap();
        let duplicate = store.create_user(&UserCreate::unlinked("sub123")).await;
        assert!(duplicate.is_err());
    }
}
