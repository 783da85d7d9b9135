// ============================================================================
// Security Configuration
// ============================================================================

use anyhow::Result;

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_TTL_HOURS, DEFAULT_BCRYPT_COST, DEFAULT_CORS_ALLOWED_ORIGINS,
    DEFAULT_JWT_ISSUER, MIN_JWT_SECRET_LEN,
};

/// Token signing, password hashing and CORS policy
#[derive(Clone)]
pub struct SecurityConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Access token TTL in hours
    pub access_token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    /// Origins allowed to call the API from a browser
    pub cors_allowed_origins: Vec<String>,
}

impl SecurityConfig {
    pub(crate) fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            );
        }

        Ok(Self {
            jwt_secret,
            jwt_issuer: std::env::var("JWT_ISSUER")
                .unwrap_or_else(|_| DEFAULT_JWT_ISSUER.to_string()),
            access_token_ttl_hours: std::env::var("ACCESS_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_HOURS),
            bcrypt_cost: std::env::var("BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BCRYPT_COST),
            cors_allowed_origins: parse_origins(
                &std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGINS.to_string()),
            ),
        })
    }

    /// Security settings with an explicit secret and defaults elsewhere
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_issuer: DEFAULT_JWT_ISSUER.to_string(),
            access_token_ttl_hours: DEFAULT_ACCESS_TOKEN_TTL_HOURS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            cors_allowed_origins: parse_origins(DEFAULT_CORS_ALLOWED_ORIGINS),
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("access_token_ttl_hours", &self.access_token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
