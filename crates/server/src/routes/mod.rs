//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Credentials (rate limited, no token)
//! POST /api/register              - Register an end-user
//! POST /api/login                 - Login as user or admin
//! POST /api/store/store-login     - Login as store owner
//!
//! # Accounts
//! PUT  /api/update-password       - Change own password (user, admin)
//! PUT  /api/store/update-password - Change own password (store)
//!
//! # Ratings
//! POST /api/rate                  - Submit or overwrite a rating (user)
//! GET  /api/users/stores          - Stores with aggregates and own rating (user)
//! GET  /api/stores/{id}/rating    - Aggregate for one store (any role)
//! GET  /api/store/ratings         - Own store's ratings and aggregate (store)
//!
//! # Administration (admin)
//! GET  /api/admin/stats           - Platform totals
//! GET  /api/admin/users           - Users and admins
//! GET  /api/admin/stores          - Stores with aggregates
//! POST /api/admin/create-user     - Create a user or admin
//! POST /api/admin/create-store    - Create a store
//! ```
//!
//! Health routes live in the binary, since readiness needs the database pool.

pub mod admin;
pub mod auth;
pub mod ratings;

use axum::{
    Json, Router,
    extract::{FromRequest, Request},
    routing::{get, post, put},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::db::Store;
use crate::error::AppError;
use crate::middleware::{StoreOnly, UserOrAdmin};
use crate::state::AppState;

/// JSON body extractor whose rejection uses the application error shape.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// `{"message": ...}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Create the credential routes router (register and login).
pub fn auth_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/register", post(auth::register::<S>))
        .route("/api/login", post(auth::login::<S>))
        .route("/api/store/store-login", post(auth::store_login::<S>))
}

/// Create the token-gated API routes router.
pub fn api_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/api/update-password",
            put(auth::update_password::<S, UserOrAdmin>),
        )
        .route(
            "/api/store/update-password",
            put(auth::update_password::<S, StoreOnly>),
        )
        .route("/api/rate", post(ratings::rate::<S>))
        .route("/api/users/stores", get(ratings::user_stores::<S>))
        .route("/api/stores/{id}/rating", get(ratings::store_rating::<S>))
        .route("/api/store/ratings", get(ratings::own_store_ratings::<S>))
        .nest("/api/admin", admin_routes())
}

/// Create the admin routes router.
pub fn admin_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/stats", get(admin::stats::<S>))
        .route("/users", get(admin::users::<S>))
        .route("/stores", get(admin::stores::<S>))
        .route("/create-user", post(admin::create_user::<S>))
        .route("/create-store", post(admin::create_store::<S>))
}

/// Create all API routes, without rate limiting.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new().merge(auth_routes()).merge(api_routes())
}
