// ============================================================================
// Image Service HTTP Handlers
// ============================================================================
//
// Endpoints under /api/images:
// - POST   /upload          - Upload and analyze
// - POST   /steganography   - Embed a signature
// - POST   /verify          - Integrity check (no auth)
// - GET    /my-images       - Caller's records
// - GET    /                - All records (admin)
// - GET    /steganography   - Records with steganography (admin)
// - GET    /ai-detected     - Records above an AI confidence threshold (admin)
// - GET    /:id             - One record (owner or admin)
// - DELETE /:id             - Delete (owner or admin)
// - GET    /test-flask      - Analysis service diagnostics
// - GET    /flask-status    - Analysis service connectivity flag
//
// ============================================================================

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::core;
use crate::analysis::UploadedFile;
use crate::auth::Capability;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::routes::extractors::AuthenticatedUser;

const DEFAULT_AI_THRESHOLD: f64 = 0.7;

/// Fields of an image upload form
#[derive(Debug, Default)]
struct ImageForm {
    file: Option<UploadedFile>,
    signature: Option<String>,
}

impl ImageForm {
    async fn parse(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(|e| {
                        AppError::validation(format!("Failed to read file: {}", e))
                    })?;
                    form.file = Some(UploadedFile::new(filename, content_type, data));
                }
                "signature" => {
                    let text = field.text().await.map_err(|e| {
                        AppError::validation(format!("Failed to read signature: {}", e))
                    })?;
                    form.signature = Some(text);
                }
                other => {
                    tracing::debug!(field = %other, "Ignoring unknown multipart field");
                }
            }
        }

        Ok(form)
    }

    /// The `file` part, rejected when missing or empty
    fn require_file(&self) -> AppResult<&UploadedFile> {
        match &self.file {
            Some(file) if !file.is_empty() => Ok(file),
            _ => Err(AppError::validation("No file provided")),
        }
    }
}

/// POST /api/images/upload
pub async fn upload_image(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = ImageForm::parse(multipart).await?;
    let file = form.require_file()?;

    let record = core::upload_and_analyze(&ctx, file, &user.username).await?;
    Ok(Json(record))
}

/// POST /api/images/steganography
pub async fn add_steganography(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = ImageForm::parse(multipart).await?;
    let file = form.require_file()?;

    let record =
        core::add_steganography_to_image(&ctx, file, form.signature.as_deref(), &user.username)
            .await?;
    Ok(Json(record))
}

/// POST /api/images/verify
pub async fn verify_image(
    State(ctx): State<Arc<AppContext>>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = ImageForm::parse(multipart).await?;
    let file = form.require_file()?;

    let body = core::verify_image_integrity(&ctx, file).await?;
    Ok(([(CONTENT_TYPE, "application/json")], body))
}

/// GET /api/images/my-images
pub async fn my_images(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let images = core::get_user_images(&ctx, &user.username).await?;
    Ok(Json(images))
}

/// GET /api/images
pub async fn all_images(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    user.require(Capability::ViewAllImages)?;
    let images = core::get_all_images(&ctx).await?;
    Ok(Json(images))
}

/// GET /api/images/:id
pub async fn get_image(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(image_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let image = core::get_accessible_image(&ctx, image_id, &user.username).await?;
    Ok(Json(image))
}

/// GET /api/images/steganography
pub async fn steganography_images(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    user.require(Capability::ViewAllImages)?;
    let images = core::get_images_with_steganography(&ctx).await?;
    Ok(Json(images))
}

#[derive(Debug, Deserialize)]
pub struct ThresholdQuery {
    pub threshold: Option<f64>,
}

impl ThresholdQuery {
    fn threshold(&self) -> f64 {
        self.threshold.unwrap_or(DEFAULT_AI_THRESHOLD)
    }
}

/// GET /api/images/ai-detected?threshold=0.7
pub async fn ai_detected_images(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Query(query): Query<ThresholdQuery>,
) -> AppResult<impl IntoResponse> {
    user.require(Capability::ViewAllImages)?;
    let images = core::get_high_ai_confidence_images(&ctx, query.threshold()).await?;
    Ok(Json(images))
}

/// DELETE /api/images/:id
pub async fn delete_image(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(image_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    core::delete_image(&ctx, image_id, &user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/images/test-flask
pub async fn test_flask(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    match core::test_connection(&ctx).await {
        Ok(response) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "Analysis service connection successful",
                "flask_response": response,
                "timestamp": Utc::now(),
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Analysis service connection test failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "message": "Analysis service unavailable",
                    "error": e.to_string(),
                    "timestamp": Utc::now(),
                })),
            )
        }
    }
}

/// GET /api/images/flask-status
pub async fn flask_status(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    let flask_url = ctx.analysis_client.base_url().to_string();

    let body = match core::test_connection(&ctx).await {
        Ok(status) => json!({
            "flask_connected": true,
            "flask_url": flask_url,
            "flask_status": status,
            "services_available": {
                "ai_detection": true,
                "steganography": true,
                "image_processing": true,
            },
        }),
        Err(e) => json!({
            "flask_connected": false,
            "flask_url": flask_url,
            "error": e.to_string(),
            "message": format!("Make sure the analysis service is running at {}", flask_url),
        }),
    };

    Json(body)
}
