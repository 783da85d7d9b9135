use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Application error type
///
/// Every failure a request can hit ends up here. The variant decides the HTTP
/// status; the `Display` text is what the client sees.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Authentication & Authorization Errors =====
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication required: {0}")]
    Auth(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    // ===== Lookup Errors =====
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Image not found: {0}")]
    ImageNotFound(i64),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // ===== Validation Errors =====
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource conflict: {0}")]
    Conflict(String),

    // ===== Analysis Service Errors =====
    #[error("Analysis service unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Analysis service error: {0}")]
    CollaboratorError(String),

    // ===== Storage Errors =====
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== Internal Server Errors =====
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) | AppError::InvalidToken(_) | AppError::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound(_) | AppError::ImageNotFound(_) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures of the external analysis service
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            AppError::CollaboratorUnavailable(_) | AppError::CollaboratorError(_)
        )
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                status = %status.as_u16(),
                "Server error occurred"
            );
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(
                error = %self,
                status = %status.as_u16(),
                "Request rejected by access control"
            );
        } else {
            tracing::debug!(
                error = %self,
                status = %status.as_u16(),
                "Client error occurred"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();

        let status = self.status_code();
        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

// ============================================================================
// Helper functions for creating common errors
// ============================================================================

impl AppError {
    /// Create an authentication error (missing or malformed credentials)
    pub fn auth(msg: impl Into<String>) -> Self {
        AppError::Auth(msg.into())
    }

    pub fn access_denied(msg: impl Into<String>) -> Self {
        AppError::AccessDenied(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Create a conflict error (409)
    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    /// Create an internal server error
    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn collaborator_unavailable(msg: impl Into<String>) -> Self {
        AppError::CollaboratorUnavailable(msg.into())
    }

    pub fn collaborator_error(msg: impl Into<String>) -> Self {
        AppError::CollaboratorError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::validation("empty").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::auth("missing").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InvalidToken("bad signature".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::access_denied("not owner").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::ImageNotFound(7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::UserNotFound("ghost".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::conflict("taken").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::collaborator_unavailable("timeout").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::collaborator_error("502").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_collaborator_failure_classification() {
        assert!(AppError::collaborator_unavailable("refused").is_collaborator_failure());
        assert!(AppError::collaborator_error("bad body").is_collaborator_failure());
        assert!(!AppError::internal("boom").is_collaborator_failure());
    }

    #[tokio::test]
    async fn test_response_body_carries_message_and_status() {
        let response = AppError::collaborator_error("status 502").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 500);
        assert_eq!(body["error"], "Analysis service error: status 502");
        assert!(body.get("error_code").is_none());
    }
}
