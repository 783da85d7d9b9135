// ============================================================================
// Analysis Service Configuration
// ============================================================================

use std::path::PathBuf;

use crate::constants::{DEFAULT_ANALYSIS_BASE_URL, DEFAULT_UPLOAD_DIR, MAX_UPLOAD_SIZE};

/// Settings for the external image analysis service
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Base URL of the analysis service (e.g., "http://localhost:5000")
    pub base_url: String,
    /// Outbound request timeout. None keeps the HTTP client default (no timeout)
    pub timeout_secs: Option<u64>,
    /// Scratch directory where uploads are staged before forwarding
    pub upload_dir: PathBuf,
    /// Maximum accepted request body on upload routes (bytes)
    pub max_upload_size: usize,
}

impl AnalysisConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            base_url: std::env::var("ANALYSIS_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_ANALYSIS_BASE_URL.to_string()),
            timeout_secs: std::env::var("ANALYSIS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_UPLOAD_SIZE),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ANALYSIS_BASE_URL.to_string(),
            timeout_secs: None,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_size: MAX_UPLOAD_SIZE,
        }
    }
}
