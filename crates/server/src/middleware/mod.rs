//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with `request_id` and caller fields)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Rate limiting on credential routes (governor)
//!
//! Authorization is not a layer: role-scoped handlers take a [`Require`]
//! extractor.

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AdminOnly, AnyRole, Require, RoleSet, StoreOnly, UserOnly, UserOrAdmin, authorize};
pub use cors::cors_layer;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
