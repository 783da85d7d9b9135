// ============================================================================
// Axum Extractors
// ============================================================================
//
// - AuthenticatedUser: validates the bearer token and yields username + role
// - OptionalAuthenticatedUser: same, but absent or invalid tokens yield None
//
// ============================================================================

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::sync::Arc;

use crate::auth::{Capability, Role};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

/// Identity and role taken from a verified bearer token
///
/// Usage:
/// ```rust,ignore
/// async fn handler(user: AuthenticatedUser, ...) -> AppResult<...> {
///     user.require(Capability::ViewAllImages)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if self.role.grants(capability) {
            Ok(())
        } else {
            Err(AppError::access_denied(format!(
                "{} role cannot perform this operation",
                self.role
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let claims = state.auth_manager.verify_token(token).map_err(|e| {
            tracing::warn!(error = %e, "JWT authentication failed");
            e
        })?;

        Ok(AuthenticatedUser {
            username: claims.sub,
            role: claims.role,
        })
    }
}

/// Bearer authentication that never rejects
#[derive(Debug, Clone)]
pub struct OptionalAuthenticatedUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for OptionalAuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await.ok();
        Ok(OptionalAuthenticatedUser(user))
    }
}

/// Extract the token from `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::auth("Missing Authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::auth("Invalid Authorization header format"))
}
