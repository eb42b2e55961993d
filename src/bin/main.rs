use anyhow::Result;
use authgate::{AuthConfig, DatabaseConfig, RefreshConfig, create_gate, serve};
use authgate::db::schema::UserCreate;
use authgate::{UserStore, create_connection, ensure_schema};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use surrealdb::sql::Datetime;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "authgate")]
#[command(about = "Request-authentication gate with delegated-credential refresh")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gate HTTP server
    Serve {
        /// Bind address, e.g. 0.0.0.0:8080
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
        #[arg(long, default_value = "memory", env = "SURREALDB_URL")]
        db_url: String,
    },
    /// Initialize the database schema
    Init {
        #[arg(long, default_value = "memory", env = "SURREALDB_URL")]
        db_url: String,
    },
    /// Seed a user record (stand-in for the out-of-scope login/linking flow)
    SeedUser {
        /// Subject claim the user's bearer credential carries
        subject: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
        /// Delegated access token to link
        #[arg(long)]
        access_token: Option<String>,
        /// Delegated refresh token to link
        #[arg(long)]
        refresh_token: Option<String>,
        /// Seconds until the delegated access token expires
        #[arg(long)]
        expires_in: Option<i64>,
        #[arg(long, default_value = "memory", env = "SURREALDB_URL")]
        db_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("authgate=info".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, db_url } => {
            let auth_config = AuthConfig::from_env()?;
            let refresh_config = RefreshConfig::from_env()?;
            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };

            let state = create_gate(auth_config, refresh_config, db_config).await?;
            serve(&bind, state).await?;
        }
        Commands::Init { db_url } => {
            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            let db = create_connection(db_config).await?;
            ensure_schema(&db).await?;
            println!("Schema applied.");
        }
        Commands::SeedUser {
            subject,
            email,
            display_name,
            access_token,
            refresh_token,
            expires_in,
            db_url,
        } => {
            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            let db = create_connection(db_config).await?;
            ensure_schema(&db).await?;

            let store = UserStore::new(db);
            let user = store
                .create_user(&UserCreate {
                    subject,
                    email,
                    display_name,
                    delegated_access_token: access_token,
                    delegated_refresh_token: refresh_token,
                    delegated_token_expires_at: expires_in
                        .map(|secs| Datetime::from(Utc::now() + Duration::seconds(secs))),
                })
                .await?;
            println!("Created user {} for subject {}", user.id, user.subject);
        }
    }

    Ok(())
}
