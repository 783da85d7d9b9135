// ============================================================================
// Configuration Constants
// ============================================================================

// Default listener
pub(crate) const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub(crate) const DEFAULT_PORT: u16 = 8080;

pub(crate) const DEFAULT_DATABASE_URL: &str = "sqlite://stegano.db?mode=rwc";

// Tokens are valid for one day, no refresh
pub(crate) const DEFAULT_ACCESS_TOKEN_TTL_HOURS: i64 = 24;
pub(crate) const DEFAULT_JWT_ISSUER: &str = "stegano-gateway";
pub(crate) const MIN_JWT_SECRET_LEN: usize = 32;

// Matches bcrypt::DEFAULT_COST
pub(crate) const DEFAULT_BCRYPT_COST: u32 = 12;

pub(crate) const DEFAULT_ANALYSIS_BASE_URL: &str = "http://localhost:5000";
pub(crate) const DEFAULT_UPLOAD_DIR: &str = "uploads";

pub(crate) const DEFAULT_CORS_ALLOWED_ORIGINS: &str =
    "http://localhost:3000,http://localhost:3001,http://localhost:3003,http://localhost:3004";

pub(crate) const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub(crate) const DEFAULT_USER_PASSWORD: &str = "user123";

// Time conversion constants
pub const SECONDS_PER_HOUR: i64 = 3600;
pub const MILLIS_PER_HOUR: i64 = SECONDS_PER_HOUR * 1000;

// Upload size limit (in bytes)
pub const MAX_UPLOAD_SIZE: usize = 20 * 1024 * 1024; // 20 MB - images only
