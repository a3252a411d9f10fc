//! Identity token codec
//!
//! Tokens are compact HS256 JWTs (`header.payload.signature`, base64url)
//! whose payload is exactly `{"userId": <id>, "exp": <unix seconds>}`.
//! They live for a fixed 30 days and cannot be revoked server-side.

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Token lifetime: 30 days, no sliding renewal.
pub const TOKEN_LIFETIME_SECS: i64 = 30 * 24 * 60 * 60;

/// Token signing configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Shared HMAC secret
    pub secret: String,
}

impl TokenConfig {
    /// Create a new TokenConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HMAC signing secret (required, must not be empty)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        Ok(TokenConfig { secret })
    }
}

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Owner of the token
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Expiration time (Unix seconds)
    pub exp: i64,
}

/// Errors raised while issuing tokens
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("user id must be positive, got {0}")]
    InvalidUserId(i64),

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Signs and verifies identity tokens with a process-wide secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `decode_at`.
        validation.validate_exp = false;
        validation.leeway = 0;

        TokenCodec {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token for `user_id` expiring 30 days from now
    pub fn encode(&self, user_id: i64) -> Result<String, TokenError> {
        self.encode_at(user_id, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now`
    pub fn encode_at(&self, user_id: i64, now: i64) -> Result<String, TokenError> {
        if user_id <= 0 {
            return Err(TokenError::InvalidUserId(user_id));
        }

        let claims = Claims {
            user_id,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Verify a token and return its user id, `None` when invalid or expired
    pub fn decode(&self, token: &str) -> Option<i64> {
        self.decode_at(token, Utc::now().timestamp())
    }

    /// Verify a token against the clock value `now`.
    ///
    /// The signature comparison is constant-time; structural problems, bad
    /// signatures, foreign algorithms and `exp <= now` are all rejected the
    /// same way.
    pub fn decode_at(&self, token: &str, now: i64) -> Option<i64> {
        if token.split('.').count() != 3 {
            debug!("rejecting token with wrong segment count");
            return None;
        }

        let claims = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("rejecting token: {}", e);
                return None;
            }
        };

        if claims.exp <= now || claims.user_id <= 0 {
            debug!("rejecting expired token for user {}", claims.user_id);
            return None;
        }

        Some(claims.user_id)
    }
}
