//! Administration route handlers. Every handler requires the admin role.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use store_ratings_core::Role;

use super::ApiJson;
use super::auth::AccountRequest;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::middleware::{AdminOnly, Require};
use crate::models::{Principal, StoreSummary};
use crate::services::{AccountKind, AdminService, PlatformStats};
use crate::state::AppState;

/// Body for creating a user or admin.
#[derive(Deserialize)]
pub struct CreateUserRequest {
    #[serde(flatten)]
    pub account: AccountRequest,
    /// `"user"` (default) or `"admin"`.
    pub role: Option<String>,
}

impl CreateUserRequest {
    fn kind(&self) -> Result<AccountKind> {
        match self.role.as_deref().map(str::parse::<Role>) {
            None | Some(Ok(Role::User)) => Ok(AccountKind::User),
            Some(Ok(Role::Admin)) => Ok(AccountKind::Admin),
            Some(Ok(Role::Store) | Err(_)) => {
                Err(AppError::BadRequest("Role must be user or admin".to_owned()))
            }
        }
    }
}

/// A newly created user or admin.
#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub message: &'static str,
    pub user: Principal,
}

/// A newly created store.
#[derive(Debug, Serialize)]
pub struct CreatedStore {
    pub message: &'static str,
    pub store: Principal,
}

/// Platform totals.
pub async fn stats<S: Store>(
    State(state): State<AppState<S>>,
    _auth: Require<AdminOnly>,
) -> Result<Json<PlatformStats>> {
    Ok(Json(AdminService::new(state.store()).stats().await?))
}

/// All users and admins, ordered by name.
pub async fn users<S: Store>(
    State(state): State<AppState<S>>,
    _auth: Require<AdminOnly>,
) -> Result<Json<Vec<Principal>>> {
    Ok(Json(AdminService::new(state.store()).list_users().await?))
}

/// All stores with their aggregates, ordered by name.
pub async fn stores<S: Store>(
    State(state): State<AppState<S>>,
    _auth: Require<AdminOnly>,
) -> Result<Json<Vec<StoreSummary>>> {
    Ok(Json(AdminService::new(state.store()).list_stores().await?))
}

/// Create a user or admin account.
pub async fn create_user<S: Store>(
    State(state): State<AppState<S>>,
    Require { caller, .. }: Require<AdminOnly>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreatedUser>)> {
    let kind = body.kind()?;
    let user = AdminService::new(state.store())
        .create_account(kind, body.account.as_input())
        .await?;

    tracing::info!(admin_id = %caller.id, principal_id = %user.id, role = %user.role, "account created by admin");
    Ok((
        StatusCode::CREATED,
        Json(CreatedUser {
            message: "User created successfully",
            user,
        }),
    ))
}

/// Create a store account.
pub async fn create_store<S: Store>(
    State(state): State<AppState<S>>,
    Require { caller, .. }: Require<AdminOnly>,
    ApiJson(body): ApiJson<AccountRequest>,
) -> Result<(StatusCode, Json<CreatedStore>)> {
    let store = AdminService::new(state.store())
        .create_account(AccountKind::Store, body.as_input())
        .await?;

    tracing::info!(admin_id = %caller.id, principal_id = %store.id, "store created by admin");
    Ok((
        StatusCode::CREATED,
        Json(CreatedStore {
            message: "Store created successfully",
            store,
        }),
    ))
}
