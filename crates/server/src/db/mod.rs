//! Persistence for principals and ratings.
//!
//! # Database
//!
//! ## Tables
//!
//! - `principal` - Users, store owners and administrators (one table, globally
//!   unique email)
//! - `rating` - One row per `(user_id, store_id)`, overwritten on re-rating
//!
//! # Backends
//!
//! Storage is abstracted behind [`PrincipalStore`] and [`RatingStore`]:
//!
//! - [`postgres::PgStore`] - production backend
//! - [`memory::MemoryStore`] - in-process backend for tests, enforcing the
//!   same uniqueness and upsert contract
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p store-ratings-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use store_ratings_core::{Email, PrincipalId, RatingValue, Role};

use crate::models::{
    NewPrincipal, Principal, PrincipalCredentials, Rating, RatingTotals, StoreRatingEntry,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Principal (account) persistence.
pub trait PrincipalStore: Send + Sync {
    /// Insert a new principal.
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken.
    fn insert_principal(
        &self,
        principal: NewPrincipal,
    ) -> impl Future<Output = Result<Principal, RepositoryError>> + Send;

    /// Look up a principal and its password hash by exact email.
    fn find_credentials(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<PrincipalCredentials>, RepositoryError>> + Send;

    /// Look up a principal by ID.
    fn find_principal(
        &self,
        id: PrincipalId,
    ) -> impl Future<Output = Result<Option<Principal>, RepositoryError>> + Send;

    /// Replace a principal's password hash.
    ///
    /// Returns `RepositoryError::NotFound` if no such principal exists.
    fn update_password_hash(
        &self,
        id: PrincipalId,
        password_hash: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// All principals with one of `roles`, ordered by name.
    fn list_principals(
        &self,
        roles: &[Role],
    ) -> impl Future<Output = Result<Vec<Principal>, RepositoryError>> + Send;

    /// Number of principals with one of `roles`.
    fn count_principals(
        &self,
        roles: &[Role],
    ) -> impl Future<Output = Result<i64, RepositoryError>> + Send;
}

/// Rating persistence.
pub trait RatingStore: Send + Sync {
    /// Insert or overwrite the rating for `(user_id, store_id)`.
    ///
    /// Returns `RepositoryError::NotFound` if either principal is missing.
    fn upsert_rating(
        &self,
        user_id: PrincipalId,
        store_id: PrincipalId,
        value: RatingValue,
    ) -> impl Future<Output = Result<Rating, RepositoryError>> + Send;

    /// Row count and value sum of a store's ratings.
    fn rating_totals(
        &self,
        store_id: PrincipalId,
    ) -> impl Future<Output = Result<RatingTotals, RepositoryError>> + Send;

    /// Every store with its rating totals, ordered by store name.
    fn stores_with_totals(
        &self,
    ) -> impl Future<Output = Result<Vec<(Principal, RatingTotals)>, RepositoryError>> + Send;

    /// A store's ratings joined with the rater's email, ordered by email.
    fn ratings_for_store(
        &self,
        store_id: PrincipalId,
    ) -> impl Future<Output = Result<Vec<StoreRatingEntry>, RepositoryError>> + Send;

    /// Every rating submitted by one user.
    fn ratings_by_user(
        &self,
        user_id: PrincipalId,
    ) -> impl Future<Output = Result<Vec<Rating>, RepositoryError>> + Send;

    /// Total number of ratings.
    fn count_ratings(&self) -> impl Future<Output = Result<i64, RepositoryError>> + Send;
}

/// A complete storage backend, shareable across request handlers.
pub trait Store: PrincipalStore + RatingStore + Clone + 'static {}

impl<T> Store for T where T: PrincipalStore + RatingStore + Clone + 'static {}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
