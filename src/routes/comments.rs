use crate::{error::AppError, extractors::CurrentUser};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Serialize, sqlx::FromRow)]
pub struct CommentResponse {
    pub uuid: Uuid,
    pub body: String,
    pub author: String,
    pub page: Uuid,
    pub parent: Option<Uuid>,
    pub created: DateTime<Utc>,
}

const COMMENT_SELECT: &str = "SELECT c.uuid, c.body, u.username AS author, pg.uuid AS page, \
     parent.uuid AS parent, c.created_at AS created
     FROM comments c
     JOIN users u ON u.id = c.author_id
     JOIN pages pg ON pg.id = c.page_id
     LEFT JOIN comments parent ON parent.id = c.parent_id";

pub async fn fetch_page_comments(
    executor: impl sqlx::PgExecutor<'_>,
    page_id: i32,
) -> Result<Vec<CommentResponse>, sqlx::Error> {
    let query = format!("{COMMENT_SELECT} WHERE c.page_id = $1 ORDER BY c.created_at ASC");
    sqlx::query_as::<_, CommentResponse>(&query)
        .bind(page_id)
        .fetch_all(executor)
        .await
}

async fn page_id_by_uuid(
    executor: impl sqlx::PgExecutor<'_>,
    page: Uuid,
) -> Result<i32, AppError> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM pages WHERE uuid = $1")
        .bind(page)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)
}

#[derive(Deserialize)]
pub struct CommentListParams {
    pub page: Uuid,
}

pub async fn get_comments(
    State(pool): State<PgPool>,
    Query(params): Query<CommentListParams>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    let page_id = page_id_by_uuid(&pool, params.page).await?;
    let comments = fetch_page_comments(&pool, page_id).await?;
    Ok(Json(comments))
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub page: Uuid,
    pub body: String,
    pub parent: Option<Uuid>,
}

pub async fn create_comment(
    State(pool): State<PgPool>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let body = payload.body.trim();
    if body.is_empty() {
        return Err(AppError::bad_request("comment body must not be empty"));
    }

    let page_id = page_id_by_uuid(&pool, payload.page).await?;

    let parent_id = match payload.parent {
        Some(parent_uuid) => Some(
            sqlx::query_scalar::<_, i32>("SELECT id FROM comments WHERE uuid = $1")
                .bind(parent_uuid)
                .fetch_optional(&pool)
                .await?
                .ok_or(AppError::NotFound)?,
        ),
        None => None,
    };

    let comment_uuid: Uuid = sqlx::query_scalar(
        "INSERT INTO comments (body, author_id, page_id, parent_id)
         VALUES ($1, $2, $3, $4)
         RETURNING uuid",
    )
    .bind(body)
    .bind(user.id)
    .bind(page_id)
    .bind(parent_id)
    .fetch_one(&pool)
    .await?;

    let query = format!("{COMMENT_SELECT} WHERE c.uuid = $1");
    let comment = sqlx::query_as::<_, CommentResponse>(&query)
        .bind(comment_uuid)
        .fetch_one(&pool)
        .await?;

    Ok(Json(comment))
}

/// Deleting a comment detaches its replies (their parent link becomes
/// null) rather than deleting them.
pub async fn delete_comment(
    State(pool): State<PgPool>,
    CurrentUser(user): CurrentUser,
    Path(uuid): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM comments WHERE uuid = $1 AND author_id = $2")
        .bind(uuid)
        .bind(user.id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
