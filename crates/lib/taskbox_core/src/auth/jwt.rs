//! JWT token generation and verification.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

use super::AuthError;
use crate::models::auth::{Role, TokenClaims};

/// Default access token lifetime: 1 hour.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Issues and verifies signed access tokens (HS256).
///
/// Holds the process-wide signing secret, sourced once at startup from
/// configuration. One instance is shared for the process lifetime so that
/// every issued token verifies against the same secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
    ttl_secs: i64,
}

// The secret must never reach logs, so Debug is written by hand.
impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec from a signing secret and a token lifetime in seconds.
    pub fn new(secret: impl Into<Vec<u8>>, ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    /// Create a codec with the default 1-hour token lifetime.
    pub fn with_default_ttl(secret: impl Into<Vec<u8>>) -> Self {
        Self::new(secret, DEFAULT_TOKEN_TTL_SECS)
    }

    /// Token lifetime in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Generate a signed access token for the given identity.
    pub fn issue(&self, user_id: &str, username: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
    }

    /// Verify an access token, returning the claims on success.
    ///
    /// Returns `None` for a bad signature, malformed payload, or elapsed
    /// expiry. Verification failures never escape as errors or panics.
    pub fn verify(&self, token: &str) -> Option<TokenClaims> {
        let key = DecodingKey::from_secret(&self.secret);
        let mut validation = Validation::default();
        validation.validate_exp = true;
        decode::<TokenClaims>(token, &key, &validation)
            .ok()
            .map(|data| data.claims)
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    // Generate and persist
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskbox")
        .join("jwt-secret")
}
