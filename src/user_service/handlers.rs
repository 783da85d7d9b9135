// ============================================================================
// User Service HTTP Handlers
// ============================================================================
//
// - GET    /api/users      - List accounts
// - POST   /api/users      - Create an account
// - GET    /api/users/:id  - Fetch one account
// - DELETE /api/users/:id  - Delete an account and its images
//
// ============================================================================

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::Role;
use crate::context::AppContext;
use crate::db::{self, PublicUser};
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
}

/// GET /api/users
pub async fn list_users(State(ctx): State<Arc<AppContext>>) -> AppResult<impl IntoResponse> {
    let users = db::users::list_users(&ctx.db_pool).await?;
    let users: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();
    Ok(Json(users))
}

/// POST /api/users
pub async fn create_user(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(AppError::validation("Username is required"));
    }
    if request.password.is_empty() {
        return Err(AppError::validation("Password is required"));
    }

    let role = request.role.unwrap_or(Role::User);
    let user = db::users::create_user(
        &ctx.db_pool,
        username,
        &request.password,
        role,
        ctx.config.security.bcrypt_cost,
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "User created");
    Ok(Json(PublicUser::from(&user)))
}

/// GET /api/users/:id
pub async fn get_user(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let user = db::users::get_user_by_id(&ctx.db_pool, user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

    Ok(Json(PublicUser::from(&user)))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    if !db::users::delete_user(&ctx.db_pool, user_id).await? {
        return Err(AppError::UserNotFound(user_id.to_string()));
    }

    tracing::info!(user_id = user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
