//! Principal roles.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of the known roles.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// The role of a principal. Fixed at creation.
///
/// `User` and `Admin` are "user-like" accounts; `Store` accounts are the
/// targets of ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "principal_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user who browses and rates stores.
    User,
    /// Store owner account; receives ratings.
    Store,
    /// Administrator; manages accounts.
    Admin,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Self; 3] = [Self::User, Self::Store, Self::Admin];

    /// Returns the lowercase wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Store => "store",
            Self::Admin => "admin",
        }
    }

    /// Whether this role belongs to the user-like kind (user or admin).
    #[must_use]
    pub const fn is_user_like(self) -> bool {
        match self {
            Self::User | Self::Admin => true,
            Self::Store => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "store" => Ok(Self::Store),
            "admin" => Ok(Self::Admin),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}
