//! Credential route handlers.
//!
//! Registration and login issue a session token alongside the principal view;
//! the password routes change the caller's own password.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use store_ratings_core::Role;

use super::{ApiJson, MessageResponse};
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::middleware::{Require, RoleSet};
use crate::models::Principal;
use crate::services::{AccountInput, AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Account fields shared by registration and admin account creation.
///
/// Every field is optional at the wire level so that an absent field is
/// reported as missing rather than as a parse error.
#[derive(Deserialize)]
pub struct AccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
}

impl AccountRequest {
    /// Borrow as service input; absent fields become empty.
    #[must_use]
    pub fn as_input(&self) -> AccountInput<'_> {
        AccountInput {
            name: self.name.as_deref().unwrap_or_default(),
            email: self.email.as_deref().unwrap_or_default(),
            password: self.password.as_deref().unwrap_or_default(),
            address: self.address.as_deref(),
        }
    }
}

/// Login body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Password change body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub new_password: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// Successful user/admin registration or login.
#[derive(Debug, Serialize)]
pub struct UserAuthResponse {
    pub user: Principal,
    pub token: String,
}

/// Successful store login.
#[derive(Debug, Serialize)]
pub struct StoreAuthResponse {
    pub store: Principal,
    pub token: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register an end-user. Always creates role `user`.
pub async fn register<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<AccountRequest>,
) -> Result<(StatusCode, Json<UserAuthResponse>)> {
    let user = AuthService::new(state.store())
        .register(body.as_input(), Role::User)
        .await?;
    let token = state.tokens().issue(user.id, user.role)?;

    Ok((StatusCode::CREATED, Json(UserAuthResponse { user, token })))
}

/// Login as a user or admin.
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<UserAuthResponse>> {
    let (user, token) = login_as(&state, &body, Role::is_user_like).await?;
    Ok(Json(UserAuthResponse { user, token }))
}

/// Login as a store owner.
pub async fn store_login<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<StoreAuthResponse>> {
    let (store, token) = login_as(&state, &body, |role| role == Role::Store).await?;
    Ok(Json(StoreAuthResponse { store, token }))
}

/// Change the caller's own password.
pub async fn update_password<S: Store, R: RoleSet>(
    State(state): State<AppState<S>>,
    Require { caller, .. }: Require<R>,
    ApiJson(body): ApiJson<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.store())
        .change_password(caller.id, body.new_password.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}

/// Authenticate and issue a token, admitting only roles accepted by `accept`.
///
/// Unknown email, wrong password and wrong kind of account all surface as
/// `invalid_credentials`.
async fn login_as<S: Store>(
    state: &AppState<S>,
    body: &LoginRequest,
    accept: impl Fn(Role) -> bool + Send,
) -> Result<(Principal, String)> {
    let principal = AuthService::new(state.store())
        .authenticate(
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(|e| match e {
            AuthError::PrincipalNotFound => AuthError::InvalidCredentials,
            other => other,
        })?;

    if !accept(principal.role) {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens().issue(principal.id, principal.role)?;
    tracing::info!(principal_id = %principal.id, role = %principal.role, "login");

    Ok((principal, token))
}
