use bcrypt::hash;
use serde::Serialize;

use super::DbPool;
use crate::auth::Role;
use crate::config::SeedConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// User as exposed over the API (no password hash)
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

pub async fn create_user(
    pool: &DbPool,
    username: &str,
    password: &str,
    role: Role,
    bcrypt_cost: u32,
) -> AppResult<User> {
    let password_hash = hash(password, bcrypt_cost)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password_hash, role)
        VALUES (?, ?, ?)
        RETURNING id, username, password_hash, role
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::conflict(format!("Username '{}' is already taken", username))
        }
        other => AppError::Database(other),
    })?;

    Ok(user)
}

pub async fn get_user_by_username(pool: &DbPool, username: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, role
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_user_by_id(pool: &DbPool, user_id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, role
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn list_users(pool: &DbPool) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, role
        FROM users
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Returns false when no such user existed
pub async fn delete_user(pool: &DbPool, user_id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    bcrypt::verify(password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Failed to verify password: {}", e)))
}

/// Resolve a username/password pair to a stored user
///
/// Unknown usernames and wrong passwords are indistinguishable to the caller.
pub async fn authenticate(pool: &DbPool, username: &str, password: &str) -> AppResult<User> {
    let user = get_user_by_username(pool, username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&user, password)? {
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

/// Create the "admin" and "user" accounts unless they already exist.
/// Returns how many accounts were created.
pub async fn seed_default_users(
    pool: &DbPool,
    seed: &SeedConfig,
    bcrypt_cost: u32,
) -> AppResult<usize> {
    let defaults = [
        ("admin", seed.admin_password.as_str(), Role::Admin),
        ("user", seed.user_password.as_str(), Role::User),
    ];

    let mut created = 0;
    for (username, password, role) in defaults {
        if get_user_by_username(pool, username).await?.is_some() {
            continue;
        }
        create_user(pool, username, password, role, bcrypt_cost).await?;
        tracing::info!(username = %username, role = %role, "Seeded default account");
        created += 1;
    }

    Ok(created)
}
