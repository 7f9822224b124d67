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

// The binary payload lives in external storage; these handlers only track
// the reference path.
#[derive(Serialize, sqlx::FromRow)]
pub struct FileResponse {
    pub uuid: Uuid,
    pub name: String,
    pub path: String,
    pub uploaded_by: String,
    pub page: Option<Uuid>,
    pub uploaded: DateTime<Utc>,
}

const FILE_SELECT: &str = "SELECT f.uuid, f.name, f.path, u.username AS uploaded_by, \
     pg.uuid AS page, f.uploaded_at AS uploaded
     FROM files f
     JOIN users u ON u.id = f.uploaded_by
     LEFT JOIN pages pg ON pg.id = f.page_id";

pub async fn fetch_page_files(
    executor: impl sqlx::PgExecutor<'_>,
    page_id: i32,
) -> Result<Vec<FileResponse>, sqlx::Error> {
    let query = format!("{FILE_SELECT} WHERE f.page_id = $1 ORDER BY f.uploaded_at ASC");
    sqlx::query_as::<_, FileResponse>(&query)
        .bind(page_id)
        .fetch_all(executor)
        .await
}

#[derive(Deserialize)]
pub struct FileListParams {
    pub page: Uuid,
}

pub async fn get_files(
    State(pool): State<PgPool>,
    Query(params): Query<FileListParams>,
) -> Result<Json<Vec<FileResponse>>, AppError> {
    let page_id = sqlx::query_scalar::<_, i32>("SELECT id FROM pages WHERE uuid = $1")
        .bind(params.page)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let files = fetch_page_files(&pool, page_id).await?;
    Ok(Json(files))
}

#[derive(Deserialize)]
pub struct CreateFileRequest {
    pub name: String,
    pub path: String,
    pub page: Option<Uuid>,
}

pub async fn create_file(
    State(pool): State<PgPool>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateFileRequest>,
) -> Result<Json<FileResponse>, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("file name must not be empty"));
    }
    if payload.path.trim().is_empty() {
        return Err(AppError::bad_request("storage path must not be empty"));
    }

    let page_id = match payload.page {
        Some(page_uuid) => Some(
            sqlx::query_scalar::<_, i32>("SELECT id FROM pages WHERE uuid = $1")
                .bind(page_uuid)
                .fetch_optional(&pool)
                .await?
                .ok_or(AppError::NotFound)?,
        ),
        None => None,
    };

    let file_uuid: Uuid = sqlx::query_scalar(
        "INSERT INTO files (name, path, uploaded_by, page_id)
         VALUES ($1, $2, $3, $4)
         RETURNING uuid",
    )
    .bind(name)
    .bind(payload.path.trim())
    .bind(user.id)
    .bind(page_id)
    .fetch_one(&pool)
    .await?;

    let query = format!("{FILE_SELECT} WHERE f.uuid = $1");
    let file = sqlx::query_as::<_, FileResponse>(&query)
        .bind(file_uuid)
        .fetch_one(&pool)
        .await?;

    Ok(Json(file))
}

pub async fn delete_file(
    State(pool): State<PgPool>,
    CurrentUser(user): CurrentUser,
    Path(uuid): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM files WHERE uuid = $1 AND uploaded_by = $2")
        .bind(uuid)
        .bind(user.id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
