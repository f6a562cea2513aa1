//! Administrator bootstrap.
//!
//! The HTTP API only lets an existing admin create other admins, so the first
//! one is created here.
//!
//! # Usage
//!
//! ```bash
//! sr-cli admin create -n "Platform Administrator Account" -e admin@example.com -p 'Adm1n!pass'
//! ```
//!
//! # Environment Variables
//!
//! - `RATINGS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use store_ratings_core::Role;
use store_ratings_server::config::{ConfigError, database_url_from_env};
use store_ratings_server::db::{PgStore, create_pool};
use store_ratings_server::services::{AccountInput, AuthError, AuthService};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Email already registered.
    #[error("An account already exists with email: {0}")]
    UserExists(String),

    /// Validation or storage failure while creating the account.
    #[error("{0}")]
    Account(AuthError),
}

/// Create an administrator account.
///
/// # Returns
///
/// The ID of the created administrator.
pub async fn create(
    name: &str,
    email: &str,
    password: &str,
    address: Option<&str>,
) -> Result<i32, AdminError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let store = PgStore::new(create_pool(&database_url).await?);

    let input = AccountInput {
        name,
        email,
        password,
        address,
    };
    let admin = AuthService::new(&store)
        .register(input, Role::Admin)
        .await
        .map_err(|e| match e {
            AuthError::DuplicateEmail => AdminError::UserExists(email.to_owned()),
            other => AdminError::Account(other),
        })?;

    tracing::info!(
        "Admin created successfully! ID: {}, Email: {}",
        admin.id,
        admin.email
    );

    Ok(admin.id.as_i32())
}
