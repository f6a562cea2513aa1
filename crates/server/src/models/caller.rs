//! Request caller identity.

use store_ratings_core::{PrincipalId, Role};

/// The principal behind a verified session token.
///
/// Resolved by the authorization gate and handed to route handlers; it is the
/// only identity a handler may act on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// Principal's database ID.
    pub id: PrincipalId,
    /// Role carried by the token.
    pub role: Role,
}
