//! Field validators for account data.
//!
//! These are the canonical bounds used by every entry point that creates or
//! changes an account (public registration, admin account creation, password
//! change and the CLI bootstrap).
//!
//! | Field    | Rule                                                        |
//! |----------|-------------------------------------------------------------|
//! | name     | 20-60 characters                                            |
//! | address  | optional, at most 400 characters                            |
//! | email    | see [`Email::parse`]                                        |
//! | password | 8-16 characters, one uppercase ASCII letter, one special    |

use thiserror::Error;

use crate::types::{Email, EmailError, RatingValueError};

/// Minimum name length in characters.
pub const NAME_MIN_CHARS: usize = 20;
/// Maximum name length in characters.
pub const NAME_MAX_CHARS: usize = 60;
/// Maximum address length in characters.
pub const ADDRESS_MAX_CHARS: usize = 400;
/// Minimum password length in characters.
pub const PASSWORD_MIN_CHARS: usize = 8;
/// Maximum password length in characters.
pub const PASSWORD_MAX_CHARS: usize = 16;
/// Characters that satisfy the "special character" rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// Why a password failed the policy.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    /// Fewer than 8 or more than 16 characters.
    #[error("password must be 8-16 characters")]
    Length,
    /// No uppercase ASCII letter.
    #[error("password must contain an uppercase letter")]
    MissingUppercase,
    /// No character from [`PASSWORD_SPECIAL_CHARS`].
    #[error("password must contain a special character")]
    MissingSpecial,
}

/// A field-level validation failure. Only the first failing rule is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or empty.
    #[error("Missing required fields")]
    MissingField(&'static str),

    #[error("Name must be between 20 and 60 characters")]
    Name,

    #[error("Please provide a valid email address")]
    Email(EmailError),

    #[error(
        "Password must be 8-16 characters with at least one uppercase letter and one special character"
    )]
    Password(PasswordError),

    #[error("Address cannot exceed 400 characters")]
    Address,

    /// Login attempted without a password.
    #[error("Password is required")]
    PasswordRequired,

    /// Password change attempted without a new password.
    #[error("New password required")]
    NewPasswordRequired,

    #[error("Rating must be between 1 and 5")]
    Rating(RatingValueError),
}

impl ValidationError {
    /// The name of the offending request field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) => *field,
            Self::Name => "name",
            Self::Email(_) => "email",
            Self::Password(_) | Self::PasswordRequired => "password",
            Self::Address => "address",
            Self::NewPasswordRequired => "newPassword",
            Self::Rating(_) => "rating",
        }
    }
}

impl From<EmailError> for ValidationError {
    fn from(err: EmailError) -> Self {
        Self::Email(err)
    }
}

impl From<PasswordError> for ValidationError {
    fn from(err: PasswordError) -> Self {
        Self::Password(err)
    }
}

impl From<RatingValueError> for ValidationError {
    fn from(err: RatingValueError) -> Self {
        Self::Rating(err)
    }
}

/// Check a password against the policy, reporting the first failing rule.
///
/// # Errors
///
/// Returns the `PasswordError` for the first rule the password breaks.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len) {
        return Err(PasswordError::Length);
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordError::MissingUppercase);
    }

    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err(PasswordError::MissingSpecial);
    }

    Ok(())
}

/// Whether `password` satisfies the policy.
#[must_use]
pub fn is_valid_password(password: &str) -> bool {
    validate_password(password).is_ok()
}

/// Check a display name is within bounds. The name is not trimmed.
///
/// # Errors
///
/// Returns `ValidationError::Name` if the length is out of range.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::Name)
    }
}

/// Check an optional address. Absent and empty addresses are accepted.
///
/// # Errors
///
/// Returns `ValidationError::Address` if the address is too long.
pub fn validate_address(address: Option<&str>) -> Result<(), ValidationError> {
    match address {
        Some(a) if a.chars().count() > ADDRESS_MAX_CHARS => Err(ValidationError::Address),
        _ => Ok(()),
    }
}

/// Parse and validate an email, wrapping failures as a field error.
///
/// # Errors
///
/// Returns `ValidationError::Email` if the address is malformed.
pub fn validate_email(email: &str) -> Result<Email, ValidationError> {
    Ok(Email::parse(email)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_policy_examples() {
        assert!(is_valid_password("Passw0rd!"));
        assert!(!is_valid_password("password"));
        assert_eq!(validate_password("P@ss1"), Err(PasswordError::Length));
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(is_valid_password("Abcdef!x")); // 8
        assert!(is_valid_password("Abcdefghijklmn!x")); // 16
        assert_eq!(validate_password("Abcde!x"), Err(PasswordError::Length)); // 7
        assert_eq!(
            validate_password("Abcdefghijklmno!x"), // 17
            Err(PasswordError::Length)
        );
    }

    #[test]
    fn test_password_requires_uppercase_and_special() {
        assert_eq!(
            validate_password("passw0rd!"),
            Err(PasswordError::MissingUppercase)
        );
        assert_eq!(
            validate_password("Passw0rd1"),
            Err(PasswordError::MissingSpecial)
        );
        // Non-ASCII uppercase does not count.
        assert_eq!(
            validate_password("ÉÉÉpass!"),
            Err(PasswordError::MissingUppercase)
        );
    }

    #[test]
    fn test_every_special_char_counts() {
        for c in PASSWORD_SPECIAL_CHARS.chars() {
            let candidate = format!("Abcdefg{c}");
            assert!(is_valid_password(&candidate), "{candidate} should pass");
        }
    }

    #[test]
    fn test_name_bounds() {
        assert!(validate_name(&"a".repeat(19)).is_err());
        assert!(validate_name(&"a".repeat(20)).is_ok());
        assert!(validate_name(&"a".repeat(60)).is_ok());
        assert!(validate_name(&"a".repeat(61)).is_err());
        // Counted in characters, not bytes.
        assert!(validate_name(&"é".repeat(20)).is_ok());
    }

    #[test]
    fn test_address_bounds() {
        assert!(validate_address(None).is_ok());
        assert!(validate_address(Some("")).is_ok());
        assert!(validate_address(Some(&"x".repeat(400))).is_ok());
        assert_eq!(
            validate_address(Some(&"x".repeat(401))),
            Err(ValidationError::Address)
        );
    }

    #[test]
    fn test_validation_messages_and_fields() {
        let err = ValidationError::Name;
        assert_eq!(err.field(), "name");
        assert_eq!(
            err.to_string(),
            "Name must be between 20 and 60 characters"
        );

        let err = validate_email("nope").unwrap_err();
        assert_eq!(err.field(), "email");
        assert_eq!(err.to_string(), "Please provide a valid email address");

        let err = ValidationError::from(PasswordError::MissingSpecial);
        assert_eq!(err.field(), "password");

        assert_eq!(
            ValidationError::Address.to_string(),
            "Address cannot exceed 400 characters"
        );
        assert_eq!(ValidationError::PasswordRequired.field(), "password");
        assert_eq!(
            ValidationError::PasswordRequired.to_string(),
            "Password is required"
        );
    }
}
