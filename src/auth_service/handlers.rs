// ============================================================================
// Auth Service HTTP Handlers
// ============================================================================
//
// - POST /api/auth/login  - Exchange credentials for a bearer token
// - POST /api/auth/logout - Acknowledge logout (tokens are stateless)
// - GET  /api/auth/me     - Caller's account
//
// ============================================================================

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use super::core::{self, LoginRequest};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::routes::extractors::{AuthenticatedUser, OptionalAuthenticatedUser};

/// POST /api/auth/login
pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let response = core::login(&ctx, &request).await?;
    Ok(Json(response))
}

/// POST /api/auth/logout
pub async fn logout(OptionalAuthenticatedUser(user): OptionalAuthenticatedUser) -> impl IntoResponse {
    match user {
        Some(user) => tracing::info!(username = %user.username, "User logged out"),
        None => tracing::debug!("Logout without a valid token"),
    }

    Json(json!({"message": "Logged out successfully"}))
}

/// GET /api/auth/me
pub async fn me(
    State(ctx): State<Arc<AppContext>>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let account = core::current_user(&ctx, &user.username).await?;
    Ok(Json(account))
}
