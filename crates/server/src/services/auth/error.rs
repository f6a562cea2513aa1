//! Authentication error types.

use thiserror::Error;

use store_ratings_core::ValidationError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A submitted field failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wrong password (or, for role-scoped logins, wrong kind of account).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No principal with the given email or ID.
    #[error("principal not found")]
    PrincipalNotFound,

    /// Email already registered.
    #[error("Email already in use")]
    DuplicateEmail,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
