//! Rating values and derived aggregates.

use core::fmt;

use serde::{Deserialize, Serialize, Serializer};

use super::id::PrincipalId;

/// Error returned when a rating is outside the 1-5 star range.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between {} and {}, got {got}", RatingValue::MIN, RatingValue::MAX)]
pub struct RatingValueError {
    /// The rejected value.
    pub got: i64,
}

/// A single star rating, 1 through 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RatingValue(u8);

impl RatingValue {
    /// Lowest allowed rating.
    pub const MIN: u8 = 1;
    /// Highest allowed rating.
    pub const MAX: u8 = 5;

    /// Create a rating, rejecting anything outside `MIN..=MAX`.
    ///
    /// # Errors
    ///
    /// Returns `RatingValueError` if `value` is out of range.
    pub fn new(value: i64) -> Result<Self, RatingValueError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingValueError { got: value })
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The value as a `SMALLINT` column value.
    #[must_use]
    pub fn as_i16(self) -> i16 {
        i16::from(self.0)
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = RatingValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i16> for RatingValue {
    type Error = RatingValueError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<RatingValue> for u8 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

impl fmt::Display for RatingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mean of a store's ratings.
///
/// Serializes as a number rounded to one decimal place, or as the string
/// `"N/A"` when the store has no ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mean {
    /// The store has not been rated.
    NoRatings,
    /// Arithmetic mean of all rating values (unrounded).
    Value(f64),
}

impl Mean {
    /// Sentinel shown when there are no ratings.
    pub const NO_RATINGS: &'static str = "N/A";

    /// The mean rounded to one decimal place, if any ratings exist.
    #[must_use]
    pub fn rounded(self) -> Option<f64> {
        match self {
            Self::NoRatings => None,
            Self::Value(mean) => Some((mean * 10.0).round() / 10.0),
        }
    }
}

impl fmt::Display for Mean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rounded() {
            Some(mean) => write!(f, "{mean:.1}"),
            None => f.write_str(Self::NO_RATINGS),
        }
    }
}

impl Serialize for Mean {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.rounded() {
            Some(mean) => serializer.serialize_f64(mean),
            None => serializer.serialize_str(Self::NO_RATINGS),
        }
    }
}

/// Count and mean of a store's ratings, computed on read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRating {
    /// The rated store.
    pub store_id: PrincipalId,
    /// Number of ratings.
    pub count: i64,
    /// Mean rating, or no-ratings sentinel.
    pub mean: Mean,
}

impl AggregateRating {
    /// Build an aggregate from a row count and the sum of rating values.
    ///
    /// A zero (or negative) count always yields [`Mean::NoRatings`].
    #[must_use]
    pub fn from_totals(store_id: PrincipalId, count: i64, sum: i64) -> Self {
        let mean = if count > 0 {
            #[allow(clippy::cast_precision_loss)] // Rating totals are far below 2^52
            let mean = sum as f64 / count as f64;
            Mean::Value(mean)
        } else {
            Mean::NoRatings
        };

        Self {
            store_id,
            count: count.max(0),
            mean,
        }
    }
}
