//! Rating domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_ratings_core::{AggregateRating, Email, Mean, PrincipalId, RatingId, RatingValue};

use super::Principal;

/// One user's rating of one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: RatingId,
    pub user_id: PrincipalId,
    pub store_id: PrincipalId,
    pub value: RatingValue,
    /// First submission.
    pub created_at: DateTime<Utc>,
    /// Last overwrite (equal to `created_at` until re-rated).
    pub updated_at: DateTime<Utc>,
}

/// Row count and value sum for a store's ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingTotals {
    pub count: i64,
    pub sum: i64,
}

impl RatingTotals {
    /// Turn the totals into a displayable aggregate.
    #[must_use]
    pub fn aggregate(self, store_id: PrincipalId) -> AggregateRating {
        AggregateRating::from_totals(store_id, self.count, self.sum)
    }
}

/// A rating as shown to the owner of the rated store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRatingEntry {
    /// Email of the user who rated.
    pub user_email: Email,
    #[serde(rename = "rating")]
    pub value: RatingValue,
    pub created_at: DateTime<Utc>,
    /// Reserved; no writer populates it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A store with its aggregate rating.
///
/// Serializes as the store's principal view extended with `avgRating` (number
/// or `"N/A"`) and `totalRatings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    #[serde(flatten)]
    pub store: Principal,
    #[serde(rename = "avgRating")]
    pub average_rating: Mean,
    pub total_ratings: i64,
    /// The requesting user's own rating, when listed for a user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<RatingValue>,
}

impl StoreSummary {
    /// Combine a store with its rating totals.
    #[must_use]
    pub fn new(store: Principal, totals: RatingTotals) -> Self {
        let aggregate = totals.aggregate(store.id);
        Self {
            store,
            average_rating: aggregate.mean,
            total_ratings: aggregate.count,
            user_rating: None,
        }
    }
}
