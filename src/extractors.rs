use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::User;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use sqlx::PgPool;

/// The caller's identity, as asserted by the upstream auth proxy through
/// a trusted request header. Token validation and sessions happen
/// upstream; this only resolves the asserted username against the
/// `users` table.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    PgPool: FromRef<S>,
    AppConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = PgPool::from_ref(state);
        let config = AppConfig::from_ref(state);

        let username = parts
            .headers
            .get(config.auth_header.as_str())
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let user = sqlx::query_as::<_, User>(
            "SELECT id, uuid, username, email, is_admin, created_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser(user))
    }
}
