//! Domain models for the rating service.
//!
//! These types represent validated domain objects separate from database row
//! types. Password hashes only ever travel inside [`PrincipalCredentials`];
//! every other type is safe to serialize into a response.

pub mod caller;
pub mod principal;
pub mod rating;

pub use caller::Caller;
pub use principal::{NewPrincipal, Principal, PrincipalCredentials};
pub use rating::{Rating, RatingTotals, StoreRatingEntry, StoreSummary};
