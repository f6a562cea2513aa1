//! Account and store administration.

use serde::Serialize;
use tracing::instrument;

use store_ratings_core::Role;

use super::auth::{AccountInput, AuthError, AuthService};
use crate::db::{PrincipalStore, RatingStore, RepositoryError};
use crate::models::{Principal, StoreSummary};

/// Roles counted as users in listings and stats.
const USER_LIKE: [Role; 2] = [Role::User, Role::Admin];

/// Platform-wide counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    /// User and admin accounts.
    pub total_users: i64,
    pub total_stores: i64,
    pub total_ratings: i64,
}

/// The kind of account an administrator may create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    User,
    Admin,
    Store,
}

impl From<AccountKind> for Role {
    fn from(kind: AccountKind) -> Self {
        match kind {
            AccountKind::User => Self::User,
            AccountKind::Admin => Self::Admin,
            AccountKind::Store => Self::Store,
        }
    }
}

/// Administrative queries and account creation.
pub struct AdminService<'a, S> {
    store: &'a S,
}

impl<'a, S: PrincipalStore + RatingStore> AdminService<'a, S> {
    /// Create a new admin service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All user and admin accounts, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<Principal>, RepositoryError> {
        self.store.list_principals(&USER_LIKE).await
    }

    /// All stores with their aggregate rating, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_stores(&self) -> Result<Vec<StoreSummary>, RepositoryError> {
        let stores = self.store.stores_with_totals().await?;
        Ok(stores
            .into_iter()
            .map(|(store, totals)| StoreSummary::new(store, totals))
            .collect())
    }

    /// Create an account of the given kind under the registration rules.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    #[instrument(skip(self, input), fields(email = %input.email, kind = ?kind))]
    pub async fn create_account(
        &self,
        kind: AccountKind,
        input: AccountInput<'_>,
    ) -> Result<Principal, AuthError> {
        AuthService::new(self.store)
            .register(input, kind.into())
            .await
    }

    /// Totals across the platform.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a count fails.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<PlatformStats, RepositoryError> {
        Ok(PlatformStats {
            total_users: self.store.count_principals(&USER_LIKE).await?,
            total_stores: self.store.count_principals(&[Role::Store]).await?,
            total_ratings: self.store.count_ratings().await?,
        })
    }
}
