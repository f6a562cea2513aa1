//! Authentication service.
//!
//! Registration, password login and password change. Passwords are hashed
//! with Argon2id and a random per-password salt; plaintext never reaches the
//! store or the logs.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use store_ratings_core::{
    Email, PrincipalId, Role, ValidationError, validate_address, validate_email, validate_name,
    validate_password,
};

use crate::db::{PrincipalStore, RepositoryError};
use crate::models::{NewPrincipal, Principal};

/// Fields submitted to create an account.
///
/// Absent fields are passed as empty strings; they are reported as missing
/// before any other rule is checked.
#[derive(Clone, Copy)]
pub struct AccountInput<'r> {
    pub name: &'r str,
    pub email: &'r str,
    pub password: &'r str,
    pub address: Option<&'r str>,
}

impl std::fmt::Debug for AccountInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("address", &self.address)
            .finish()
    }
}

/// Authentication service.
///
/// Handles registration, login, and password changes.
pub struct AuthService<'a, S> {
    store: &'a S,
}

impl<'a, S: PrincipalStore> AuthService<'a, S> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create an account with the given role.
    ///
    /// Fields are checked in order (missing, name, email, password, address)
    /// and only the first failure is reported.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a field is missing or invalid.
    /// Returns `AuthError::DuplicateEmail` if the email is already registered.
    #[instrument(skip(self, input), fields(email = %input.email, role = %role))]
    pub async fn register(&self, input: AccountInput<'_>, role: Role) -> Result<Principal, AuthError> {
        let (email, address) = validate_account(&input)?;

        // The unique constraint is authoritative; this just avoids a wasted hash.
        if self.store.find_credentials(&email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = hash_password(input.password)?;

        let principal = self
            .store
            .insert_principal(NewPrincipal {
                name: input.name.to_owned(),
                email,
                address,
                role,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::DuplicateEmail,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(principal_id = %principal.id, "account created");
        Ok(principal)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the email is malformed or the password empty.
    /// Returns `AuthError::PrincipalNotFound` if no account has this email.
    /// Returns `AuthError::InvalidCredentials` if the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(ValidationError::PasswordRequired.into());
        }

        let credentials = self
            .store
            .find_credentials(&email)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        verify_password(password, &credentials.password_hash)?;

        Ok(credentials.principal)
    }

    /// Replace a principal's password.
    ///
    /// Previously issued tokens remain valid until they expire.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the new password is empty or fails the policy.
    /// Returns `AuthError::PrincipalNotFound` if the principal does not exist.
    #[instrument(skip(self, new_password), fields(id = %id))]
    pub async fn change_password(&self, id: PrincipalId, new_password: &str) -> Result<(), AuthError> {
        if new_password.is_empty() {
            return Err(ValidationError::NewPasswordRequired.into());
        }
        validate_password(new_password).map_err(ValidationError::from)?;

        let password_hash = hash_password(new_password)?;

        self.store
            .update_password_hash(id, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::PrincipalNotFound,
                other => AuthError::Repository(other),
            })?;

        tracing::info!("password changed");
        Ok(())
    }
}

/// Run the account field rules in order, returning the parsed email and the
/// normalized address (empty becomes absent).
fn validate_account(input: &AccountInput<'_>) -> Result<(Email, Option<String>), ValidationError> {
    for (field, value) in [
        ("name", input.name),
        ("email", input.email),
        ("password", input.password),
    ] {
        if value.is_empty() {
            return Err(ValidationError::MissingField(field));
        }
    }

    validate_name(input.name)?;
    let email = validate_email(input.email)?;
    validate_password(input.password)?;

    let address = input.address.filter(|a| !a.is_empty());
    validate_address(address)?;

    Ok((email, address.map(str::to_owned)))
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::PrincipalCredentials;
    use store_ratings_core::PasswordError;

    /// Store whose email lookup always misses, as when a concurrent
    /// registration commits between the lookup and the insert.
    struct LookupMisses(MemoryStore);

    impl PrincipalStore for LookupMisses {
        async fn insert_principal(&self, principal: NewPrincipal) -> Result<Principal, RepositoryError> {
            self.0.insert_principal(principal).await
        }

        async fn find_credentials(
            &self,
            _email: &Email,
        ) -> Result<Option<PrincipalCredentials>, RepositoryError> {
            Ok(None)
        }

        async fn find_principal(&self, id: PrincipalId) -> Result<Option<Principal>, RepositoryError> {
            self.0.find_principal(id).await
        }

        async fn update_password_hash(
            &self,
            id: PrincipalId,
            password_hash: &str,
        ) -> Result<(), RepositoryError> {
            self.0.update_password_hash(id, password_hash).await
        }

        async fn list_principals(&self, roles: &[Role]) -> Result<Vec<Principal>, RepositoryError> {
            self.0.list_principals(roles).await
        }

        async fn count_principals(&self, roles: &[Role]) -> Result<i64, RepositoryError> {
            self.0.count_principals(roles).await
        }
    }

    const NAME: &str = "Alexandra Wellington-Smythe";

    fn input<'r>(email: &'r str, password: &'r str) -> AccountInput<'r> {
        AccountInput {
            name: NAME,
            email,
            password,
            address: None,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Passw0rd!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Passw0rd!", &hash).is_ok());
        assert!(matches!(
            verify_password("Passw0rd?", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(
            hash_password("Passw0rd!").unwrap(),
            hash_password("Passw0rd!").unwrap()
        );
    }

    #[test]
    fn test_validation_order() {
        // Everything wrong: missing field wins.
        let err = validate_account(&AccountInput {
            name: "short",
            email: "",
            password: "x",
            address: None,
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("email"));

        // Name before email.
        let err = validate_account(&AccountInput {
            name: "short",
            email: "bad",
            password: "x",
            address: None,
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::Name);

        // Email before password.
        let err = validate_account(&input("bad", "x")).unwrap_err();
        assert_eq!(err.field(), "email");

        // Password before address.
        let long = "x".repeat(401);
        let err = validate_account(&AccountInput {
            address: Some(&long),
            ..input("a@b.co", "weak")
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::Password(PasswordError::Length));

        let err = validate_account(&AccountInput {
            address: Some(&long),
            ..input("a@b.co", "Passw0rd!")
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::Address);
    }

    #[test]
    fn test_empty_address_is_absent() {
        let (_, address) = validate_account(&AccountInput {
            address: Some(""),
            ..input("a@b.co", "Passw0rd!")
        })
        .unwrap();
        assert_eq!(address, None);
    }

    #[tokio::test]
    async fn test_register_once() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let principal = auth
            .register(input("alex@example.com", "Passw0rd!"), Role::User)
            .await
            .unwrap();
        assert_eq!(principal.role, Role::User);
        assert_eq!(principal.email.as_str(), "alex@example.com");

        let err = auth
            .register(input("alex@example.com", "Passw0rd!"), Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_insert_conflict_is_duplicate_email() {
        let store = LookupMisses(MemoryStore::new());
        let auth = AuthService::new(&store);
        auth.register(input("jordan@example.com", "Passw0rd!"), Role::User)
            .await
            .unwrap();

        let err = auth
            .register(input("jordan@example.com", "Passw0rd!"), Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
        assert_eq!(store.count_principals(&[Role::User]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stored_hash_is_not_plaintext() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let principal = auth
            .register(input("alex@example.com", "Passw0rd!"), Role::User)
            .await
            .unwrap();

        let creds = store.find_credentials(&principal.email).await.unwrap().unwrap();
        assert!(!creds.password_hash.contains("Passw0rd!"));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let registered = auth
            .register(input("alex@example.com", "Passw0rd!"), Role::User)
            .await
            .unwrap();

        let principal = auth
            .authenticate("alex@example.com", "Passw0rd!")
            .await
            .unwrap();
        assert_eq!(principal, registered);

        assert!(matches!(
            auth.authenticate("alex@example.com", "Wr0ng!pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("nobody@example.com", "Passw0rd!").await,
            Err(AuthError::PrincipalNotFound)
        ));
        // Exact, case-sensitive lookup.
        assert!(matches!(
            auth.authenticate("Alex@example.com", "Passw0rd!").await,
            Err(AuthError::PrincipalNotFound)
        ));
        assert!(matches!(
            auth.authenticate("alex@example.com", "").await,
            Err(AuthError::Validation(ValidationError::PasswordRequired))
        ));
        assert!(matches!(
            auth.authenticate("not-an-email", "Passw0rd!").await,
            Err(AuthError::Validation(ValidationError::Email(_)))
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let principal = auth
            .register(input("alex@example.com", "Passw0rd!"), Role::User)
            .await
            .unwrap();

        assert!(matches!(
            auth.change_password(principal.id, "weak").await,
            Err(AuthError::Validation(ValidationError::Password(_)))
        ));
        assert!(matches!(
            auth.change_password(principal.id, "").await,
            Err(AuthError::Validation(ValidationError::NewPasswordRequired))
        ));

        auth.change_password(principal.id, "N3w!Secret").await.unwrap();
        assert!(auth.authenticate("alex@example.com", "N3w!Secret").await.is_ok());
        assert!(matches!(
            auth.authenticate("alex@example.com", "Passw0rd!").await,
            Err(AuthError::InvalidCredentials)
        ));

        assert!(matches!(
            auth.change_password(PrincipalId::new(999), "N3w!Secret").await,
            Err(AuthError::PrincipalNotFound)
        ));
    }
}
