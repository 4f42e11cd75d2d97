//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use thiserror::Error;

/// Errors shared by the database-facing commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] techshop_api::db::RepositoryError),

    #[error("Auth error: {0}")]
    Auth(#[from] techshop_api::services::auth::AuthError),

    #[error("Invalid seed data: {0}")]
    InvalidSeedData(String),
}

/// Resolve the database URL the same way the API binary does.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    if let Ok(value) = std::env::var("API_DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(CommandError::MissingEnvVar("API_DATABASE_URL"))
}
