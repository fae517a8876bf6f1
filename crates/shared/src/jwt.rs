//! JWT session token generation and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::auth::Claims;
use crate::types::UserId;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Session token settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret shared by signing and verification.
    pub secret: String,
    /// Session token lifetime in days.
    pub token_expires_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            token_expires_days: 30,
        }
    }
}

/// Why a session token could not be issued or accepted.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Signing the claims failed.
    #[error("could not sign session token: {0}")]
    Signing(String),

    /// Signature, structure or claims did not check out.
    #[error("session token rejected: {0}")]
    Rejected(String),

    /// Signature is valid but `exp` has passed.
    #[error("session token expired")]
    Expired,
}

/// Signs and verifies session tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("token_expires_days", &self.config.token_expires_days)
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Derives the signing and verification keys from `config.secret`.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issues a session token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Signing` if the claims cannot be encoded.
    pub fn generate_token(&self, user_id: UserId, email: &str) -> Result<String, JwtError> {
        let expires_at = Utc::now() + Duration::days(self.config.token_expires_days);
        let claims = Claims::new(user_id, email, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    /// Verifies a token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::Rejected` for malformed or forged tokens.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Rejected(e.to_string()),
            })
    }

    /// Returns the token lifetime in seconds, for the cookie `Max-Age`.
    #[must_use]
    pub const fn token_max_age_secs(&self) -> i64 {
        self.config.token_expires_days * 86_400
    }
}
