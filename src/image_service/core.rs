// ============================================================================
// Image Service - Core Business Logic
// ============================================================================
//
// Upload orchestration on top of the image record store and the analysis
// client. Every operation makes at most one call to the analysis service.
//
// ============================================================================

use serde_json::Value;

use crate::analysis::UploadedFile;
use crate::auth::Capability;
use crate::context::AppContext;
use crate::db::{self, AnalysisOutcome, AnalysisStatus, ImageRecord, NewImage, User};
use crate::error::{AppError, AppResult};

async fn resolve_user(ctx: &AppContext, username: &str) -> AppResult<User> {
    db::users::get_user_by_username(&ctx.db_pool, username)
        .await?
        .ok_or_else(|| AppError::UserNotFound(username.to_string()))
}

fn require_content(file: &UploadedFile) -> AppResult<()> {
    if file.is_empty() {
        return Err(AppError::validation("No file provided"));
    }
    Ok(())
}

/// Owner or a role with `ManageAnyImage`
fn authorize(user: &User, image: &ImageRecord) -> AppResult<()> {
    if image.is_owned_by(user.id) || user.role.grants(Capability::ManageAnyImage) {
        Ok(())
    } else {
        Err(AppError::access_denied(format!(
            "Image {} does not belong to {}",
            image.id, user.username
        )))
    }
}

/// Create a PENDING record, analyze the file, then write the terminal state.
///
/// Analysis failures are recorded on the returned record as FAILED, they do
/// not fail the call.
pub async fn upload_and_analyze(
    ctx: &AppContext,
    file: &UploadedFile,
    username: &str,
) -> AppResult<ImageRecord> {
    require_content(file)?;
    let user = resolve_user(ctx, username).await?;

    let record = db::images::insert_image(
        &ctx.db_pool,
        &NewImage {
            filename: file.filename.clone(),
            user_id: user.id,
            status: AnalysisStatus::Pending,
            fields: Default::default(),
            results: None,
        },
    )
    .await?;

    tracing::info!(
        image_id = record.id,
        username = %user.username,
        filename = %record.filename,
        "Image record created, starting analysis"
    );

    let outcome = match ctx.analysis_client.analyze(file).await {
        Ok(response) => AnalysisOutcome::completed(response.report().fields(), response.raw),
        Err(e) => {
            tracing::warn!(image_id = record.id, error = %e, "Analysis failed");
            AnalysisOutcome::failed(e)
        }
    };

    let record = match db::images::record_analysis_outcome(&ctx.db_pool, record.id, &outcome).await
    {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(image_id = record.id, error = %e, "Failed to record analysis outcome");
            if let Err(fallback) =
                db::images::mark_analysis_failed(&ctx.db_pool, record.id, &e).await
            {
                tracing::error!(image_id = record.id, error = %fallback, "Failed to mark image as FAILED");
            }
            return Err(e);
        }
    };
    tracing::info!(
        image_id = record.id,
        status = ?record.analysis_status,
        "Analysis finished"
    );

    Ok(record)
}

/// Embed a signature via the analysis service and record the result.
///
/// The record is only created once the service has answered; a failed call
/// leaves no record behind.
pub async fn add_steganography_to_image(
    ctx: &AppContext,
    file: &UploadedFile,
    signature: Option<&str>,
    username: &str,
) -> AppResult<ImageRecord> {
    require_content(file)?;
    let user = resolve_user(ctx, username).await?;

    let response = ctx
        .analysis_client
        .add_steganography(file, signature)
        .await?;

    let mut fields = response.report().fields();
    fields.has_steganography = Some(true);

    let record = db::images::insert_image(
        &ctx.db_pool,
        &NewImage {
            filename: file.filename.clone(),
            user_id: user.id,
            status: AnalysisStatus::Completed,
            fields,
            results: Some(response.raw),
        },
    )
    .await?;

    tracing::info!(
        image_id = record.id,
        username = %user.username,
        signed = signature.map_or(false, |s| !s.is_empty()),
        "Steganography added"
    );

    Ok(record)
}

/// Passthrough to the integrity check; nothing is stored.
/// Returns the response body exactly as the service sent it.
pub async fn verify_image_integrity(ctx: &AppContext, file: &UploadedFile) -> AppResult<String> {
    require_content(file)?;
    let response = ctx.analysis_client.verify_integrity(file).await?;
    Ok(response.raw)
}

pub async fn get_user_images(ctx: &AppContext, username: &str) -> AppResult<Vec<ImageRecord>> {
    let user = resolve_user(ctx, username).await?;
    db::images::list_images_by_user(&ctx.db_pool, user.id).await
}

pub async fn get_all_images(ctx: &AppContext) -> AppResult<Vec<ImageRecord>> {
    db::images::list_all_images(&ctx.db_pool).await
}

pub async fn get_image_by_id(ctx: &AppContext, image_id: i64) -> AppResult<ImageRecord> {
    db::images::get_image_by_id(&ctx.db_pool, image_id)
        .await?
        .ok_or(AppError::ImageNotFound(image_id))
}

/// Fetch a record the caller owns, or any record for admins
pub async fn get_accessible_image(
    ctx: &AppContext,
    image_id: i64,
    username: &str,
) -> AppResult<ImageRecord> {
    let image = get_image_by_id(ctx, image_id).await?;
    let user = resolve_user(ctx, username).await?;
    authorize(&user, &image)?;
    Ok(image)
}

pub async fn get_images_with_steganography(ctx: &AppContext) -> AppResult<Vec<ImageRecord>> {
    db::images::list_images_with_steganography(&ctx.db_pool).await
}

pub async fn get_high_ai_confidence_images(
    ctx: &AppContext,
    threshold: f64,
) -> AppResult<Vec<ImageRecord>> {
    db::images::list_images_above_ai_confidence(&ctx.db_pool, threshold).await
}

pub async fn delete_image(ctx: &AppContext, image_id: i64, username: &str) -> AppResult<()> {
    let image = get_image_by_id(ctx, image_id).await?;
    let user = resolve_user(ctx, username).await?;
    authorize(&user, &image)?;

    if !db::images::delete_image(&ctx.db_pool, image_id).await? {
        return Err(AppError::ImageNotFound(image_id));
    }

    tracing::info!(image_id = image_id, username = %user.username, "Image deleted");
    Ok(())
}

pub async fn test_connection(ctx: &AppContext) -> AppResult<Value> {
    ctx.analysis_client.test_connection().await
}
