//! Rating ledger.
//!
//! Ratings are upserted per `(user, store)` and aggregated on every read;
//! nothing is cached.

use std::collections::HashMap;

use thiserror::Error;
use tracing::instrument;

use store_ratings_core::{AggregateRating, PrincipalId, RatingValue, Role, ValidationError};

use crate::db::{PrincipalStore, RatingStore, RepositoryError};
use crate::models::{Rating, StoreRatingEntry, StoreSummary};

/// Errors from rating operations.
#[derive(Debug, Error)]
pub enum RatingError {
    /// Rating value out of range.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The rater does not exist or is not an end-user.
    #[error("user not found")]
    UserNotFound,

    /// The target does not exist or is not a store.
    #[error("store not found")]
    StoreNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Rating submission and aggregation.
pub struct RatingService<'a, S> {
    store: &'a S,
}

impl<'a, S: PrincipalStore + RatingStore> RatingService<'a, S> {
    /// Create a new rating service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Record `user_id`'s rating of `store_id`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::Validation` if `value` is outside 1-5.
    /// Returns `RatingError::UserNotFound` / `RatingError::StoreNotFound` if
    /// either principal is missing or has the wrong role.
    #[instrument(skip(self), fields(user_id = %user_id, store_id = %store_id))]
    pub async fn submit(
        &self,
        user_id: PrincipalId,
        store_id: PrincipalId,
        value: i64,
    ) -> Result<Rating, RatingError> {
        let value = RatingValue::new(value).map_err(ValidationError::from)?;

        self.require_role(user_id, Role::User, RatingError::UserNotFound)
            .await?;
        self.require_role(store_id, Role::Store, RatingError::StoreNotFound)
            .await?;

        let rating = self
            .store
            .upsert_rating(user_id, store_id, value)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => RatingError::StoreNotFound,
                other => RatingError::Repository(other),
            })?;

        tracing::info!(rating_id = %rating.id, value = %value, "rating recorded");
        Ok(rating)
    }

    /// Count and mean of a store's ratings, computed fresh.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::StoreNotFound` if `store_id` is not a store.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn aggregate_for(&self, store_id: PrincipalId) -> Result<AggregateRating, RatingError> {
        self.require_role(store_id, Role::Store, RatingError::StoreNotFound)
            .await?;

        let totals = self.store.rating_totals(store_id).await?;
        Ok(totals.aggregate(store_id))
    }

    /// A store's ratings with the raters' emails, ordered by email.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::StoreNotFound` if `store_id` is not a store.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn ratings_for_store(
        &self,
        store_id: PrincipalId,
    ) -> Result<Vec<StoreRatingEntry>, RatingError> {
        self.require_role(store_id, Role::Store, RatingError::StoreNotFound)
            .await?;

        Ok(self.store.ratings_for_store(store_id).await?)
    }

    /// Every store with its aggregate and the user's own rating, if any.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::Repository` if the store cannot be read.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn stores_for_user(
        &self,
        user_id: PrincipalId,
    ) -> Result<Vec<StoreSummary>, RatingError> {
        let own: HashMap<PrincipalId, RatingValue> = self
            .store
            .ratings_by_user(user_id)
            .await?
            .into_iter()
            .map(|r| (r.store_id, r.value))
            .collect();

        let stores = self.store.stores_with_totals().await?;

        Ok(stores
            .into_iter()
            .map(|(store, totals)| {
                let user_rating = own.get(&store.id).copied();
                StoreSummary {
                    user_rating,
                    ..StoreSummary::new(store, totals)
                }
            })
            .collect())
    }

    async fn require_role(
        &self,
        id: PrincipalId,
        role: Role,
        missing: RatingError,
    ) -> Result<(), RatingError> {
        match self.store.find_principal(id).await? {
            Some(principal) if principal.role == role => Ok(()),
            _ => Err(missing),
        }
    }
}
