//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and password changes
//! - `tokens` - Stateless session tokens
//! - `ratings` - Rating submission and aggregation
//! - `admin` - Account administration and platform stats
//!
//! Services borrow a storage backend for the duration of one call; they hold
//! no state of their own.

pub mod admin;
pub mod auth;
pub mod ratings;
pub mod tokens;

pub use admin::{AccountKind, AdminService, PlatformStats};
pub use auth::{AccountInput, AuthError, AuthService};
pub use ratings::{RatingError, RatingService};
pub use tokens::{Claims, TokenError, TokenIssuer};
