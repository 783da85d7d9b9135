use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Account role. Stored as upper-case text ("ADMIN" / "USER")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

/// Privileges checked by the API surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// List every record, including steganography and AI-detection reports
    ViewAllImages,
    /// Read or delete records owned by someone else
    ManageAnyImage,
}

impl Role {
    pub fn grants(self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::User => match capability {
                Capability::ViewAllImages | Capability::ManageAnyImage => false,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    pub role: Role,
    pub jti: String, // JWT ID (unique per token)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    pub iss: String, // Issuer
}

/// A freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: i64,
}

pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Access token TTL in hours
    access_token_ttl_hours: i64,
    issuer: String,
}

impl AuthManager {
    pub fn new(config: &Config) -> Result<Self> {
        let security = &config.security;
        if security.jwt_secret.trim().is_empty() {
            anyhow::bail!("No JWT configuration provided. Set JWT_SECRET");
        }

        tracing::info!(
            issuer = %security.jwt_issuer,
            ttl_hours = security.access_token_ttl_hours,
            "Initializing JWT with HS256 algorithm"
        );

        Ok(Self {
            encoding_key: EncodingKey::from_secret(security.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(security.jwt_secret.as_bytes()),
            access_token_ttl_hours: security.access_token_ttl_hours,
            issuer: security.jwt_issuer.clone(),
        })
    }

    /// Create access token carrying the username and role
    pub fn create_token(&self, username: &str, role: Role) -> Result<IssuedToken> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.access_token_ttl_hours);
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: username.to_string(),
            role,
            jti: jti.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to encode JWT token")?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at: exp.timestamp(),
        })
    }

    /// Verify signature, issuer and expiry
    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => {
                    tracing::debug!(error = %e, "JWT verification failed");
                    AppError::InvalidToken(e.to_string())
                }
            })
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod auth_tests;
