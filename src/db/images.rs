use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DbPool;
use crate::error::{AppError, AppResult};

/// Lifecycle of an image record. PENDING is only ever followed by one of
/// the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum AnalysisStatus {
    Pending,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AnalysisStatus::Pending)
    }
}

/// Image record joined with its owner's username
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: i64,
    pub filename: String,
    pub image_path: Option<String>,
    pub perceptual_hash: Option<String>,
    pub md5_hash: Option<String>,
    pub ai_confidence: Option<f64>,
    pub has_steganography: Option<bool>,
    pub metadata_json: Option<String>,
    pub upload_timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub owner_username: String,
    pub analysis_status: AnalysisStatus,
    pub analysis_results: Option<String>,
}

impl ImageRecord {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

/// Typed columns extracted from a collaborator response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisFields {
    pub ai_confidence: Option<f64>,
    pub has_steganography: Option<bool>,
    pub perceptual_hash: Option<String>,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub user_id: i64,
    pub status: AnalysisStatus,
    pub fields: AnalysisFields,
    pub results: Option<String>,
}

/// Final state written once the collaborator call has returned
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub status: AnalysisStatus,
    pub fields: AnalysisFields,
    pub results: Option<String>,
}

impl AnalysisOutcome {
    pub fn completed(fields: AnalysisFields, raw_response: String) -> Self {
        Self {
            status: AnalysisStatus::Completed,
            fields,
            results: Some(raw_response),
        }
    }

    /// Failed outcome: typed fields stay empty, the error text is archived
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            status: AnalysisStatus::Failed,
            fields: AnalysisFields::default(),
            results: Some(format!("Error: {}", error)),
        }
    }
}

const SELECT_IMAGES: &str = r#"
    SELECT i.id, i.filename, i.image_path, i.perceptual_hash, i.md5_hash,
           i.ai_confidence, i.has_steganography, i.metadata_json, i.upload_timestamp,
           i.user_id, u.username AS owner_username, i.analysis_status, i.analysis_results
    FROM images i
    JOIN users u ON u.id = i.user_id
"#;

pub async fn insert_image(pool: &DbPool, image: &NewImage) -> AppResult<ImageRecord> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO images (
            filename, image_path, perceptual_hash, ai_confidence, has_steganography,
            upload_timestamp, user_id, analysis_status, analysis_results
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&image.filename)
    .bind(&image.fields.image_path)
    .bind(&image.fields.perceptual_hash)
    .bind(image.fields.ai_confidence)
    .bind(image.fields.has_steganography)
    .bind(Utc::now())
    .bind(image.user_id)
    .bind(image.status)
    .bind(&image.results)
    .fetch_one(pool)
    .await?;

    get_image_by_id(pool, id)
        .await?
        .ok_or(AppError::ImageNotFound(id))
}

/// Move a PENDING record to its terminal state
pub async fn record_analysis_outcome(
    pool: &DbPool,
    image_id: i64,
    outcome: &AnalysisOutcome,
) -> AppResult<ImageRecord> {
    if !outcome.status.is_terminal() {
        return Err(AppError::internal("Analysis outcome must be terminal"));
    }

    let result = sqlx::query(
        r#"
        UPDATE images
        SET analysis_status = ?,
            ai_confidence = ?,
            has_steganography = ?,
            perceptual_hash = ?,
            image_path = ?,
            analysis_results = ?
        WHERE id = ? AND analysis_status = 'PENDING'
        "#,
    )
    .bind(outcome.status)
    .bind(outcome.fields.ai_confidence)
    .bind(outcome.fields.has_steganography)
    .bind(&outcome.fields.perceptual_hash)
    .bind(&outcome.fields.image_path)
    .bind(&outcome.results)
    .bind(image_id)
    .execute(pool)
    .await?;

    let record = get_image_by_id(pool, image_id)
        .await?
        .ok_or(AppError::ImageNotFound(image_id))?;

    if result.rows_affected() == 0 {
        return Err(AppError::conflict(format!(
            "Image {} is already {:?}",
            image_id, record.analysis_status
        )));
    }

    Ok(record)
}

/// Status-only fallback when the full outcome could not be written.
/// Returns false when the record had already left PENDING.
pub async fn mark_analysis_failed(
    pool: &DbPool,
    image_id: i64,
    error: impl std::fmt::Display,
) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE images
        SET analysis_status = 'FAILED',
            analysis_results = ?
        WHERE id = ? AND analysis_status = 'PENDING'
        "#,
    )
    .bind(format!("Error: {}", error))
    .bind(image_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_image_by_id(pool: &DbPool, image_id: i64) -> AppResult<Option<ImageRecord>> {
    let sql = format!("{} WHERE i.id = ?", SELECT_IMAGES);
    let image = sqlx::query_as::<_, ImageRecord>(&sql)
        .bind(image_id)
        .fetch_optional(pool)
        .await?;

    Ok(image)
}

/// Owner's records, newest first
pub async fn list_images_by_user(pool: &DbPool, user_id: i64) -> AppResult<Vec<ImageRecord>> {
    let sql = format!(
        "{} WHERE i.user_id = ? ORDER BY i.upload_timestamp DESC, i.id DESC",
        SELECT_IMAGES
    );
    let images = sqlx::query_as::<_, ImageRecord>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(images)
}

pub async fn list_all_images(pool: &DbPool) -> AppResult<Vec<ImageRecord>> {
    let sql = format!("{} ORDER BY i.id", SELECT_IMAGES);
    let images = sqlx::query_as::<_, ImageRecord>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(images)
}

pub async fn list_images_with_steganography(pool: &DbPool) -> AppResult<Vec<ImageRecord>> {
    let sql = format!(
        "{} WHERE i.has_steganography = TRUE ORDER BY i.id",
        SELECT_IMAGES
    );
    let images = sqlx::query_as::<_, ImageRecord>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(images)
}

/// Records whose AI confidence is strictly above `threshold`
pub async fn list_images_above_ai_confidence(
    pool: &DbPool,
    threshold: f64,
) -> AppResult<Vec<ImageRecord>> {
    let sql = format!(
        "{} WHERE i.ai_confidence > ? ORDER BY i.ai_confidence DESC, i.id",
        SELECT_IMAGES
    );
    let images = sqlx::query_as::<_, ImageRecord>(&sql)
        .bind(threshold)
        .fetch_all(pool)
        .await?;

    Ok(images)
}

/// Returns false when no such record existed
pub async fn delete_image(pool: &DbPool, image_id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM images WHERE id = ?")
        .bind(image_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::{test_pool, users};

    async fn owner(pool: &DbPool, username: &str) -> i64 {
        users::create_user(pool, username, "pw", Role::User, 4)
            .await
            .unwrap()
            .id
    }

    fn pending(filename: &str, user_id: i64) -> NewImage {
        NewImage {
            filename: filename.to_string(),
            user_id,
            status: AnalysisStatus::Pending,
            fields: AnalysisFields::default(),
            results: None,
        }
    }

    fn completed(filename: &str, user_id: i64, confidence: f64, stego: bool) -> NewImage {
        NewImage {
            filename: filename.to_string(),
            user_id,
            status: AnalysisStatus::Completed,
            fields: AnalysisFields {
                ai_confidence: Some(confidence),
                has_steganography: Some(stego),
                ..Default::default()
            },
            results: Some("{}".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_joins_owner() {
        let (pool, _dir) = test_pool().await;
        let alice = owner(&pool, "alice").await;

        let record = insert_image(&pool, &pending("photo.png", alice)).await.unwrap();
        assert_eq!(record.filename, "photo.png");
        assert_eq!(record.owner_username, "alice");
        assert_eq!(record.analysis_status, AnalysisStatus::Pending);
        assert!(record.has_steganography.is_none());
        assert!(record.is_owned_by(alice));
    }

    #[tokio::test]
    async fn test_outcome_is_written_once() {
        let (pool, _dir) = test_pool().await;
        let alice = owner(&pool, "alice").await;
        let record = insert_image(&pool, &pending("photo.png", alice)).await.unwrap();

        let fields = AnalysisFields {
            ai_confidence: Some(0.92),
            has_steganography: Some(false),
            perceptual_hash: Some("abc123".to_string()),
            image_path: Some("/store/photo.png".to_string()),
        };
        let updated = record_analysis_outcome(
            &pool,
            record.id,
            &AnalysisOutcome::completed(fields, "{\"ok\":true}".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(updated.analysis_status, AnalysisStatus::Completed);
        assert_eq!(updated.ai_confidence, Some(0.92));
        assert_eq!(updated.perceptual_hash.as_deref(), Some("abc123"));
        assert_eq!(updated.analysis_results.as_deref(), Some("{\"ok\":true}"));

        let again =
            record_analysis_outcome(&pool, record.id, &AnalysisOutcome::failed("late")).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_failed_outcome_keeps_fields_empty() {
        let (pool, _dir) = test_pool().await;
        let alice = owner(&pool, "alice").await;
        let record = insert_image(&pool, &pending("photo.png", alice)).await.unwrap();

        let failed = record_analysis_outcome(
            &pool,
            record.id,
            &AnalysisOutcome::failed("connection refused"),
        )
        .await
        .unwrap();
        assert_eq!(failed.analysis_status, AnalysisStatus::Failed);
        assert_eq!(
            failed.analysis_results.as_deref(),
            Some("Error: connection refused")
        );
        assert!(failed.ai_confidence.is_none());
        assert!(failed.image_path.is_none());
    }

    #[tokio::test]
    async fn test_mark_failed_only_touches_pending() {
        let (pool, _dir) = test_pool().await;
        let alice = owner(&pool, "alice").await;
        let pending_record = insert_image(&pool, &pending("a.png", alice)).await.unwrap();
        let done = insert_image(&pool, &pending("b.png", alice)).await.unwrap();
        record_analysis_outcome(
            &pool,
            done.id,
            &AnalysisOutcome::completed(AnalysisFields::default(), "{}".to_string()),
        )
        .await
        .unwrap();

        assert!(mark_analysis_failed(&pool, pending_record.id, "disk full").await.unwrap());
        let failed = get_image_by_id(&pool, pending_record.id).await.unwrap().unwrap();
        assert_eq!(failed.analysis_status, AnalysisStatus::Failed);
        assert_eq!(failed.analysis_results.as_deref(), Some("Error: disk full"));

        assert!(!mark_analysis_failed(&pool, done.id, "late").await.unwrap());
        let untouched = get_image_by_id(&pool, done.id).await.unwrap().unwrap();
        assert_eq!(untouched.analysis_status, AnalysisStatus::Completed);
        assert_eq!(untouched.analysis_results.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_user_listing_is_newest_first() {
        let (pool, _dir) = test_pool().await;
        let alice = owner(&pool, "alice").await;
        let bob = owner(&pool, "bob").await;

        let first = insert_image(&pool, &pending("a.png", alice)).await.unwrap();
        let second = insert_image(&pool, &pending("b.png", alice)).await.unwrap();
        insert_image(&pool, &pending("c.png", bob)).await.unwrap();

        let mine = list_images_by_user(&pool, alice).await.unwrap();
        let ids: Vec<i64> = mine.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        assert_eq!(list_all_images(&pool).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_filtered_listings() {
        let (pool, _dir) = test_pool().await;
        let alice = owner(&pool, "alice").await;

        insert_image(&pool, &completed("low.png", alice, 0.3, true)).await.unwrap();
        insert_image(&pool, &completed("edge.png", alice, 0.7, false)).await.unwrap();
        insert_image(&pool, &completed("high.png", alice, 0.95, false)).await.unwrap();
        insert_image(&pool, &pending("pending.png", alice)).await.unwrap();

        let stego = list_images_with_steganography(&pool).await.unwrap();
        assert_eq!(stego.len(), 1);
        assert_eq!(stego[0].filename, "low.png");

        let ai = list_images_above_ai_confidence(&pool, 0.7).await.unwrap();
        assert_eq!(ai.len(), 1);
        assert_eq!(ai[0].filename, "high.png");

        assert_eq!(list_images_above_ai_confidence(&pool, 0.0).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_and_cascade() {
        let (pool, _dir) = test_pool().await;
        let alice = owner(&pool, "alice").await;
        let a = insert_image(&pool, &pending("a.png", alice)).await.unwrap();
        let b = insert_image(&pool, &pending("b.png", alice)).await.unwrap();

        assert!(delete_image(&pool, a.id).await.unwrap());
        assert!(!delete_image(&pool, a.id).await.unwrap());

        users::delete_user(&pool, alice).await.unwrap();
        assert!(get_image_by_id(&pool, b.id).await.unwrap().is_none());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = ImageRecord {
            id: 1,
            filename: "photo.png".to_string(),
            image_path: None,
            perceptual_hash: Some("abc".to_string()),
            md5_hash: None,
            ai_confidence: Some(0.5),
            has_steganography: None,
            metadata_json: None,
            upload_timestamp: Utc::now(),
            user_id: 7,
            owner_username: "alice".to_string(),
            analysis_status: AnalysisStatus::Completed,
            analysis_results: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["perceptualHash"], "abc");
        assert_eq!(json["aiConfidence"], 0.5);
        assert_eq!(json["analysisStatus"], "COMPLETED");
        assert_eq!(json["ownerUsername"], "alice");
        assert!(json.get("uploadTimestamp").is_some());
    }
}
