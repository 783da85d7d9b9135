// ============================================================================
// Stegano Config - Centralized configuration management
// ============================================================================
//
// Loads gateway configuration from environment variables (and an optional
// .env file) with sensible defaults.
//
// ============================================================================

mod analysis;
mod constants;
mod database;
mod security;
mod seed;

pub use analysis::AnalysisConfig;
pub use constants::{MAX_UPLOAD_SIZE, MILLIS_PER_HOUR, SECONDS_PER_HOUR};
pub use database::DbConfig;
pub use security::SecurityConfig;
pub use seed::SeedConfig;

use anyhow::Result;
use constants::*;

/// Main configuration structure for the gateway
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub port: u16,
    pub rust_log: String,

    // Sub-configurations
    pub db: DbConfig,
    pub security: SecurityConfig,
    pub analysis: AnalysisConfig,
    pub seed: SeedConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            db: DbConfig::from_env(),
            security: SecurityConfig::from_env()?,
            analysis: AnalysisConfig::from_env(),
            seed: SeedConfig::from_env(),
        };

        tracing::debug!(
            database_url = %config.database_url,
            analysis_url = %config.analysis.base_url,
            upload_dir = %config.analysis.upload_dir.display(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Configuration with defaults everywhere except the signing secret
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            rust_log: "info".to_string(),
            db: DbConfig::default(),
            security: SecurityConfig::with_secret(jwt_secret),
            analysis: AnalysisConfig::default(),
            seed: SeedConfig::default(),
        }
    }

    /// Socket address string for the HTTP listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Token lifetime in milliseconds, as reported to clients at login
    pub fn access_token_ttl_millis(&self) -> i64 {
        self.security.access_token_ttl_hours * MILLIS_PER_HOUR
    }
}
