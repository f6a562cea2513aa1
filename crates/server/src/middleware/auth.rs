//! Authorization gate.
//!
//! Every role-scoped route takes a [`Require`] extractor naming the roles it
//! admits. The extractor reads `Authorization: Bearer <token>`, verifies the
//! token, checks the role and hands the resulting [`Caller`] to the handler.
//! Registration and login are the only routes without one.

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use store_ratings_core::Role;

use crate::error::{AppError, set_sentry_user};
use crate::models::Caller;
use crate::services::TokenIssuer;
use crate::state::AppState;

/// A set of roles admitted by a route.
pub trait RoleSet: Send + Sync + 'static {
    /// Roles that pass the gate.
    const ALLOWED: &'static [Role];
}

/// End-users only.
pub struct UserOnly;
/// Store owners only.
pub struct StoreOnly;
/// Administrators only.
pub struct AdminOnly;
/// End-users and administrators.
pub struct UserOrAdmin;
/// Any authenticated principal.
pub struct AnyRole;

impl RoleSet for UserOnly {
    const ALLOWED: &'static [Role] = &[Role::User];
}

impl RoleSet for StoreOnly {
    const ALLOWED: &'static [Role] = &[Role::Store];
}

impl RoleSet for AdminOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin];
}

impl RoleSet for UserOrAdmin {
    const ALLOWED: &'static [Role] = &[Role::User, Role::Admin];
}

impl RoleSet for AnyRole {
    const ALLOWED: &'static [Role] = &Role::ALL;
}

/// Extractor that requires a valid token whose role is in `R`.
///
/// Rejects with `unauthenticated` (401) when the token is missing, malformed,
/// tampered or expired, and with `forbidden` (403) when the role is not
/// admitted.
///
/// # Example
///
/// ```rust,ignore
/// async fn stats(Require { caller, .. }: Require<AdminOnly>) -> impl IntoResponse {
///     format!("hello admin {}", caller.id)
/// }
/// ```
pub struct Require<R> {
    /// The verified caller.
    pub caller: Caller,
    roles: PhantomData<fn() -> R>,
}

impl<S, R> FromRequestParts<AppState<S>> for Require<R>
where
    S: Send + Sync + 'static,
    R: RoleSet,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let caller = authorize(
            state.tokens(),
            parts.headers.get(AUTHORIZATION),
            R::ALLOWED,
        )?;

        Ok(Self {
            caller,
            roles: PhantomData,
        })
    }
}

/// Verify a bearer token and check its role against `allowed`.
///
/// On success the caller is recorded on the current span and as the Sentry
/// user.
///
/// # Errors
///
/// Returns `AppError::Unauthenticated` for a missing or invalid token and
/// `AppError::Forbidden` if the role is not in `allowed`.
pub fn authorize(
    tokens: &TokenIssuer,
    authorization: Option<&HeaderValue>,
    allowed: &[Role],
) -> Result<Caller, AppError> {
    let token = authorization
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_owned()))?;

    let caller = tokens.verify(token)?;

    let span = Span::current();
    span.record("principal_id", caller.id.as_i32());
    span.record("principal_role", caller.role.as_str());
    set_sentry_user(&caller.id, caller.role.as_str());

    if !allowed.contains(&caller.role) {
        tracing::debug!(role = %caller.role, "role not permitted");
        return Err(AppError::Forbidden);
    }

    Ok(caller)
}

/// Token from an `Authorization` value; the scheme name is case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
