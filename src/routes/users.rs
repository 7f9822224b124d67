use crate::{error::AppError, extractors::CurrentUser, models::User};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Serialize)]
pub struct UserResponse {
    pub uuid: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            uuid: user.uuid,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created: user.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
}

/// Record a new identity. Credentials and sign-in belong to the upstream
/// auth provider.
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let username = payload.username.trim();
    let email = payload.email.trim();
    if username.is_empty() {
        return Err(AppError::bad_request("username must not be empty"));
    }
    if !email.contains('@') {
        return Err(AppError::bad_request("email address is not valid"));
    }

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email)
         VALUES ($1, $2)
         RETURNING id, uuid, username, email, is_admin, created_at",
    )
    .bind(username)
    .bind(email)
    .fetch_one(&pool)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db) if db.is_unique_violation() => AppError::bad_request("username already taken"),
        _ => AppError::from(e),
    })?;

    Ok(Json(user.into()))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}
