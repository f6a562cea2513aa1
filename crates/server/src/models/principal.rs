//! Principal (account) domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_ratings_core::{Email, PrincipalId, Role};

/// An account: end-user, store owner or administrator.
///
/// This is the sanitized view of a principal; the password hash is not part of
/// it and cannot leak through serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Unique principal ID.
    pub id: PrincipalId,
    /// Display name.
    pub name: String,
    /// Login email (case-sensitive, unique).
    pub email: Email,
    /// Optional postal address.
    pub address: Option<String>,
    /// Role, fixed at creation.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// A principal together with its stored password hash.
///
/// Only returned by credential lookups. Implements `Debug` manually to redact
/// the hash.
#[derive(Clone)]
pub struct PrincipalCredentials {
    /// The principal.
    pub principal: Principal,
    /// PHC-format password hash.
    pub password_hash: String,
}

impl std::fmt::Debug for PrincipalCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalCredentials")
            .field("principal", &self.principal)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Validated input for inserting a principal.
#[derive(Clone)]
pub struct NewPrincipal {
    pub name: String,
    pub email: Email,
    pub address: Option<String>,
    pub role: Role,
    pub password_hash: String,
}
