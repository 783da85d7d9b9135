use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::context::AppContext;
use crate::db::{self, PublicUser};
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
    pub username: String,
    pub role: Role,
    /// Token lifetime in milliseconds
    pub expires_in: i64,
}

/// Verify credentials and issue an access token
pub async fn login(ctx: &AppContext, request: &LoginRequest) -> AppResult<AuthResponse> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let user = db::users::authenticate(&ctx.db_pool, &request.username, &request.password)
        .await
        .map_err(|e| {
            tracing::warn!(username = %request.username, "Login failed");
            e
        })?;

    let issued = ctx.auth_manager.create_token(&user.username, user.role)?;

    tracing::info!(username = %user.username, role = %user.role, jti = %issued.jti, "User logged in");

    Ok(AuthResponse {
        token: issued.token,
        token_type: "Bearer",
        username: user.username,
        role: user.role,
        expires_in: ctx.config.access_token_ttl_millis(),
    })
}

/// Stored account behind a verified token
pub async fn current_user(ctx: &AppContext, username: &str) -> AppResult<PublicUser> {
    let user = db::users::get_user_by_username(&ctx.db_pool, username)
        .await?
        .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

    Ok(PublicUser::from(&user))
}
