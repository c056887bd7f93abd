//! JWT token generation and validation
//!
//! Tokens are stateless: nothing is stored server-side, and a token is
//! trusted purely on its signature and expiry.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// The user the token was issued to
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| anyhow::anyhow!("Invalid user ID in token"))
    }
}

/// Pre-computed JWT keys for efficient token operations
/// These are expensive to create, so we cache them in AppState
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    /// Create new JWT keys from secret
    /// This should be called once at startup
    pub fn new(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }
        Ok(Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        })
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// JWT service for token operations
///
/// Design: Uses pre-computed keys to avoid expensive key derivation
/// on every request. Keys are wrapped in Arc for cheap cloning.
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    token_expiry_secs: i64,
}

impl JwtService {
    /// Create a new JWT service with pre-computed keys
    ///
    /// Fails only on misconfiguration, which is fatal at startup.
    /// Call this once and store it in AppState; do NOT create per-request.
    pub fn new(secret: &str, token_expiry_secs: i64) -> Result<Self> {
        if token_expiry_secs <= 0 {
            anyhow::bail!("JWT token expiry must be positive");
        }
        Ok(Self {
            keys: JwtKeys::new(secret)?,
            token_expiry_secs,
        })
    }

    /// Sign a token asserting `user_id`, valid for the configured lifetime
    #[inline]
    pub fn sign(&self, user_id: Uuid) -> Result<String> {
        self.sign_with_expiry(user_id, self.token_expiry_secs)
    }

    fn sign_with_expiry(&self, user_id: Uuid, expiry_secs: i64) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(expiry_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, self.keys.encoding())
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {}", e))
    }

    /// Validate a token and return claims
    ///
    /// Rejects bad signatures, expired tokens and payloads whose subject is
    /// not a user ID.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let token_data = decode::<Claims>(token, self.keys.decoding(), &validation)
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        token_data.claims.user_id()?;
        Ok(token_data.claims)
    }

    /// Get token expiry in seconds
    #[inline]
    pub fn token_expiry_secs(&self) -> i64 {
        self.token_expiry_secs
    }
}
