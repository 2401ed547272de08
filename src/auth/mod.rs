use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// `None` when the expiry falls outside the representable date range.
    pub fn new(username: String, issued_at: DateTime<Utc>, lifetime: Duration) -> Option<Self> {
        let expires_at = issued_at.checked_add_signed(lifetime)?;
        Some(Self {
            username,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }
}

/// Identity attached to a request once its token checks out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub username: String,
}

impl From<Claims> for AdminPrincipal {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username")]
    InvalidUsername,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("JWT generation error: {0}")]
    TokenGeneration(#[source] jsonwebtoken::errors::Error),

    #[error("Token lifetime of {0} hours is out of range")]
    LifetimeOutOfRange(u64),

    #[error("Password check task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Checks the admin credential and issues / verifies HS256 tokens.
pub struct TokenService {
    admin_username: String,
    admin_password_hash: String,
    expiry_hours: u64,
    lifetime: Option<Duration>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("admin_username", &self.admin_username)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(security: &SecurityConfig) -> Self {
        let secret = security.jwt_secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            admin_username: security.admin_username.clone(),
            admin_password_hash: security.admin_password_hash.clone(),
            expiry_hours: security.jwt_expiry_hours,
            lifetime: i64::try_from(security.jwt_expiry_hours)
                .ok()
                .and_then(Duration::try_hours),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn lifetime(&self) -> Option<Duration> {
        self.lifetime
    }

    /// Verify the admin credential and return a freshly signed token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if username != self.admin_username {
            tracing::warn!(username, "login rejected: unknown username");
            return Err(AuthError::InvalidUsername);
        }

        let password = password.to_string();
        let hash = self.admin_password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        if !matches {
            tracing::warn!(username, "login rejected: wrong password");
            return Err(AuthError::InvalidPassword);
        }

        let token = self.issue(username, Utc::now())?;
        tracing::info!(username, "admin logged in");
        Ok(token)
    }

    /// Sign a token for `username` as if issued at `issued_at`.
    pub fn issue(&self, username: &str, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = self
            .lifetime
            .and_then(|lifetime| Claims::new(username.to_string(), issued_at, lifetime))
            .ok_or(AuthError::LifetimeOutOfRange(self.expiry_hours))?;
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::TokenGeneration)
    }

    /// Check signature and expiry and return the principal the token names.
    pub fn verify(&self, token: &str) -> Result<AdminPrincipal, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(data.claims.into())
    }
}
