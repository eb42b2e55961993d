use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;

pub type Db = Surreal<Any>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("SURREALDB_URL").unwrap_or_else(|_| "memory".to_string()),
            namespace: env::var("SURREALDB_NAMESPACE").unwrap_or_else(|_| "authgate".to_string()),
            database: env::var("SURREALDB_DATABASE").unwrap_or_else(|_| "gate".to_string()),
            username: env::var("SURREALDB_USERNAME").ok(),
            password: env::var("SURREALDB_PASSWORD").ok(),
        }
    }
}

pub async fn create_connection(config: DatabaseConfig) -> Result<Db> {
    let db = surrealdb::engine::any::connect(config.url).await?;

    // Sign in if credentials are provided
    if let (Some(username), Some(password)) = (config.username, config.password) {
        db.signin(Root {
            username: &username,
            password: &password,
        })
        .await?;
    }

    // Use the specified namespace and database
    db.use_ns(config.namespace).use_db(config.database).await?;

    Ok(db)
}

pub async fn ensure_schema(db: &Db) -> Result<()> {
    let schema_queries = vec![
        // User table. The delegated_* fields are only ever written by the
        // refresh step; the verification stage never mutates this table.
        "DEFINE TABLE user SCHEMAFULL;
         DEFINE FIELD subject ON TABLE user TYPE string;
         DEFINE FIELD email ON TABLE user TYPE option<string>;
         DEFINE FIELD display_name ON TABLE user TYPE option<string>;
         DEFINE FIELD delegated_access_token ON TABLE user TYPE option<string>;
         DEFINE FIELD delegated_refresh_token ON TABLE user TYPE option<string>;
         DEFINE FIELD delegated_token_expires_at ON TABLE user TYPE option<datetime>;
         DEFINE FIELD created_at ON TABLE user VALUE time::now();
         DEFINE FIELD updated_at ON TABLE user VALUE time::now();",
        // One record per subject
        "DEFINE INDEX user_subject ON TABLE user COLUMNS subject UNIQUE;",
    ];

    for query in schema_queries {
        db.query(query).await?;
    }

    Ok(())
}
