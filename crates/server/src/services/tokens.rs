//! Session token issuing and verification.
//!
//! Tokens are stateless: `base64url(claims) "." base64url(HMAC-SHA256(claims))`,
//! both parts unpadded. The MAC covers the encoded claims exactly as sent.
//! There is no revocation list; a token is valid until `exp`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use store_ratings_core::{PrincipalId, Role};

use crate::config::TokenConfig;
use crate::models::Caller;

/// Token verification and signing errors.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Not two base64url segments, or claims are not valid JSON.
    #[error("malformed token")]
    Malformed,

    /// Signature does not match the claims.
    #[error("invalid token signature")]
    InvalidSignature,

    /// `exp` has passed.
    #[error("token expired")]
    Expired,

    /// The signing key was rejected by the MAC.
    #[error("invalid signing key: {0}")]
    Key(String),

    /// Claims could not be encoded.
    #[error("failed to encode claims: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Signed claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal ID.
    pub sub: PrincipalId,
    /// Principal role.
    pub role: Role,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

/// Issues and verifies session tokens with a process-wide key.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    /// Create an issuer from configuration.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            ttl: config.ttl,
        }
    }

    /// Issue a token for a principal, valid from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the claims cannot be signed.
    pub fn issue(&self, id: PrincipalId, role: Role) -> Result<String, TokenError> {
        self.issue_at(id, role, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the claims cannot be signed.
    pub fn issue_at(
        &self,
        id: PrincipalId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token and return the caller it identifies.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Malformed`, `TokenError::InvalidSignature` or
    /// `TokenError::Expired`.
    pub fn verify(&self, token: &str) -> Result<Caller, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// See [`TokenIssuer::verify`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Caller, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        // Constant-time comparison
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(TokenError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(Caller {
            id: claims.sub,
            role: claims.role,
        })
    }

    fn mac(&self) -> Result<Hmac<Sha256>, TokenError> {
        Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| TokenError::Key(e.to_string()))
    }
}
