// ============================================================================
// Analysis Service Client
// ============================================================================
//
// Synchronous round trips to the external analysis service:
// - POST /api/v2/upload            (analyze)
// - POST /api/v2/add_steganography (embed signature)
// - POST /api/v2/verify_integrity  (integrity check)
// - GET  /api/v2/test              (connectivity)
//
// No retries. Uploads are staged in the scratch directory for the duration
// of the call only.
//
// ============================================================================

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use super::report::AnalysisReport;
use super::upload::{StagedFile, UploadedFile};
use crate::config::AnalysisConfig;
use crate::error::{AppError, AppResult};

const UPLOAD_PATH: &str = "/api/v2/upload";
const ADD_STEGANOGRAPHY_PATH: &str = "/api/v2/add_steganography";
const VERIFY_INTEGRITY_PATH: &str = "/api/v2/verify_integrity";
const TEST_PATH: &str = "/api/v2/test";

/// Successful response: the body exactly as received plus its parsed form
#[derive(Debug, Clone)]
pub struct AnalysisResponse {
    pub raw: String,
    pub body: Value,
}

impl AnalysisResponse {
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport::from_value(&self.body)
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
    upload_dir: PathBuf,
}

impl AnalysisClient {
    pub fn new(config: &AnalysisConfig) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            upload_dir: config.upload_dir.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn analyze(&self, file: &UploadedFile) -> AppResult<AnalysisResponse> {
        self.post_file(UPLOAD_PATH, file, None).await
    }

    /// Signature is only sent when non-empty
    pub async fn add_steganography(
        &self,
        file: &UploadedFile,
        signature: Option<&str>,
    ) -> AppResult<AnalysisResponse> {
        let signature = signature.filter(|s| !s.is_empty());
        self.post_file(ADD_STEGANOGRAPHY_PATH, file, signature).await
    }

    pub async fn verify_integrity(&self, file: &UploadedFile) -> AppResult<AnalysisResponse> {
        self.post_file(VERIFY_INTEGRITY_PATH, file, None).await
    }

    pub async fn test_connection(&self) -> AppResult<Value> {
        let url = self.url(TEST_PATH);
        tracing::debug!(url = %url, "Testing analysis service connection");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(&url, e))?;

        Ok(read_json(&url, response).await?.body)
    }

    async fn post_file(
        &self,
        path: &str,
        file: &UploadedFile,
        signature: Option<&str>,
    ) -> AppResult<AnalysisResponse> {
        let url = self.url(path);
        let staged = StagedFile::stage(&self.upload_dir, file).await?;

        let mut part = Part::bytes(staged.read().await?).file_name(file.filename.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| AppError::validation(format!("Invalid content type: {}", e)))?;
        }

        let mut form = Form::new().part("file", part);
        if let Some(signature) = signature {
            form = form.text("signature", signature.to_string());
        }

        tracing::info!(
            url = %url,
            filename = %file.filename,
            bytes = file.len(),
            "Forwarding file to analysis service"
        );

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| unavailable(&url, e))?;

        let result = read_json(&url, response).await;
        drop(staged);
        result
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn unavailable(url: &str, e: reqwest::Error) -> AppError {
    tracing::warn!(url = %url, error = %e, timeout = e.is_timeout(), "Analysis service unreachable");
    if e.is_timeout() {
        AppError::collaborator_unavailable(format!("request to {} timed out", url))
    } else {
        AppError::collaborator_unavailable(format!("could not reach {}: {}", url, e))
    }
}

/// Require a 2xx status and a JSON object body
async fn read_json(url: &str, response: reqwest::Response) -> AppResult<AnalysisResponse> {
    let status = response.status();
    let raw = response.text().await.map_err(|e| {
        if e.is_timeout() {
            AppError::collaborator_unavailable(format!("response from {} timed out", url))
        } else {
            AppError::collaborator_error(format!("unreadable response from {}: {}", url, e))
        }
    })?;

    if !status.is_success() {
        tracing::warn!(url = %url, status = %status.as_u16(), "Analysis service returned error status");
        return Err(AppError::collaborator_error(format!(
            "{} returned HTTP {}: {}",
            url,
            status.as_u16(),
            raw.chars().take(200).collect::<String>()
        )));
    }

    let body: Value = serde_json::from_str(&raw).map_err(|e| {
        AppError::collaborator_error(format!("malformed JSON from {}: {}", url, e))
    })?;
    if !body.is_object() {
        return Err(AppError::collaborator_error(format!(
            "expected a JSON object from {}",
            url
        )));
    }

    Ok(AnalysisResponse { raw, body })
}
