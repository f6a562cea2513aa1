//! Rating route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use store_ratings_core::{AggregateRating, Mean, PrincipalId, ValidationError};

use super::ApiJson;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::middleware::{AnyRole, Require, StoreOnly, UserOnly};
use crate::models::{Rating, StoreRatingEntry, StoreSummary};
use crate::services::RatingService;
use crate::state::AppState;

/// Rating submission body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub store_id: Option<i32>,
    pub rating: Option<i64>,
}

/// Result of a rating submission.
#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub message: &'static str,
    pub rating: Rating,
    /// The store's aggregate after this submission.
    pub aggregate: AggregateRating,
}

/// A store owner's view of its own ratings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRatingsResponse {
    pub ratings: Vec<StoreRatingEntry>,
    pub average_rating: Mean,
    pub total_ratings: i64,
}

/// Submit or overwrite the caller's rating of a store.
pub async fn rate<S: Store>(
    State(state): State<AppState<S>>,
    Require { caller, .. }: Require<UserOnly>,
    ApiJson(body): ApiJson<RateRequest>,
) -> Result<Json<RateResponse>> {
    let store_id = body
        .store_id
        .map(PrincipalId::new)
        .ok_or(ValidationError::MissingField("storeId"))?;
    let value = body
        .rating
        .ok_or(ValidationError::MissingField("rating"))?;

    let ratings = RatingService::new(state.store());
    let rating = ratings.submit(caller.id, store_id, value).await?;
    let aggregate = ratings.aggregate_for(store_id).await?;

    Ok(Json(RateResponse {
        message: "Rating submitted successfully",
        rating,
        aggregate,
    }))
}

/// Every store with its aggregate and the caller's own rating.
pub async fn user_stores<S: Store>(
    State(state): State<AppState<S>>,
    Require { caller, .. }: Require<UserOnly>,
) -> Result<Json<Vec<StoreSummary>>> {
    let stores = RatingService::new(state.store())
        .stores_for_user(caller.id)
        .await?;
    Ok(Json(stores))
}

/// Aggregate rating of one store.
pub async fn store_rating<S: Store>(
    State(state): State<AppState<S>>,
    _auth: Require<AnyRole>,
    Path(id): Path<String>,
) -> Result<Json<AggregateRating>> {
    let store_id = id
        .parse::<i32>()
        .map(PrincipalId::new)
        .map_err(|_| AppError::NotFound("Store not found".to_owned()))?;

    let aggregate = RatingService::new(state.store())
        .aggregate_for(store_id)
        .await?;
    Ok(Json(aggregate))
}

/// The calling store's ratings, ordered by rater email, with its aggregate.
pub async fn own_store_ratings<S: Store>(
    State(state): State<AppState<S>>,
    Require { caller, .. }: Require<StoreOnly>,
) -> Result<Json<StoreRatingsResponse>> {
    let service = RatingService::new(state.store());
    let ratings = service.ratings_for_store(caller.id).await?;
    let aggregate = service.aggregate_for(caller.id).await?;

    Ok(Json(StoreRatingsResponse {
        ratings,
        average_rating: aggregate.mean,
        total_ratings: aggregate.count,
    }))
}
