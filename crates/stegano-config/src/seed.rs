// ============================================================================
// First-run Seed Accounts
// ============================================================================

use crate::constants::{DEFAULT_ADMIN_PASSWORD, DEFAULT_USER_PASSWORD};

/// Initial passwords of the "admin" and "user" accounts created on first start
#[derive(Clone)]
pub struct SeedConfig {
    pub admin_password: String,
    pub user_password: String,
}

impl SeedConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            admin_password: std::env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
            user_password: std::env::var("USER_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_USER_PASSWORD.to_string()),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            user_password: DEFAULT_USER_PASSWORD.to_string(),
        }
    }
}

impl std::fmt::Debug for SeedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedConfig").finish_non_exhaustive()
    }
}
