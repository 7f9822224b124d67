use crate::{
    error::AppError,
    extractors::CurrentUser,
    models::Page,
    routes::{comments, files},
    slug::{self, SlugScope},
    tags::{self, TagTarget},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Serialize, sqlx::FromRow)]
pub struct PageSummary {
    pub uuid: Uuid,
    pub title: String,
    pub slug: String,
    pub is_public: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct PageDetailResponse {
    pub uuid: Uuid,
    pub title: String,
    pub slug: String,
    pub content: Option<String>,
    pub is_public: bool,
    pub author: String,
    pub project: String,
    pub tags: Vec<String>,
    pub tags_text: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub comments: Vec<comments::CommentResponse>,
    pub files: Vec<files::FileResponse>,
}

pub async fn fetch_project_pages(
    executor: impl sqlx::PgExecutor<'_>,
    project_id: i32,
) -> Result<Vec<PageSummary>, sqlx::Error> {
    sqlx::query_as::<_, PageSummary>(
        "SELECT uuid, title, slug, is_public, created_at AS created, updated_at AS updated
         FROM pages WHERE project_id = $1
         ORDER BY created_at ASC",
    )
    .bind(project_id)
    .fetch_all(executor)
    .await
}

async fn project_id_by_slug(
    executor: impl sqlx::PgExecutor<'_>,
    slug: &str,
) -> Result<i32, AppError> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM projects WHERE slug = $1")
        .bind(slug)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_pages(
    State(pool): State<PgPool>,
    Path(project_slug): Path<String>,
) -> Result<Json<Vec<PageSummary>>, AppError> {
    let project_id = project_id_by_slug(&pool, &project_slug).await?;
    let pages = fetch_project_pages(&pool, project_id).await?;
    Ok(Json(pages))
}

pub async fn get_one_page(
    State(pool): State<PgPool>,
    Path((project_slug, page_slug)): Path<(String, String)>,
) -> Result<Json<PageDetailResponse>, AppError> {
    let page = sqlx::query_as::<_, Page>(
        "SELECT pg.id, pg.uuid, pg.title, pg.slug, pg.content, pg.is_public,
                pg.author_id, pg.project_id, pg.created_at, pg.updated_at
         FROM pages pg
         JOIN projects p ON p.id = pg.project_id
         WHERE pg.slug = $1 AND p.slug = $2",
    )
    .bind(&page_slug)
    .bind(&project_slug)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound)?;

    let author: String = sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
        .bind(page.author_id)
        .fetch_one(&pool)
        .await?;

    let page_tags = tags::tags_for(&pool, TagTarget::Page(page.id)).await?;
    let page_comments = comments::fetch_page_comments(&pool, page.id).await?;
    let page_files = files::fetch_page_files(&pool, page.id).await?;

    Ok(Json(detail_response(
        page,
        author,
        project_slug,
        page_tags,
        page_comments,
        page_files,
    )))
}

#[derive(Deserialize)]
pub struct CreatePageRequest {
    pub title: String,
    pub content: Option<String>,
    pub tags_text: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

/// Any authenticated user may add a page to a project; the page's author
/// is the caller.
pub async fn create_page(
    State(pool): State<PgPool>,
    CurrentUser(user): CurrentUser,
    Path(project_slug): Path<String>,
    Json(payload): Json<CreatePageRequest>,
) -> Result<Json<PageDetailResponse>, AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }

    let mut tx = pool.begin().await?;

    let project_id = project_id_by_slug(&mut *tx, &project_slug).await?;
    let page_slug = slug::assign_slug(&mut *tx, SlugScope::Pages, title, None, None).await?;

    let page = sqlx::query_as::<_, Page>(
        "INSERT INTO pages (title, slug, content, is_public, author_id, project_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, uuid, title, slug, content, is_public, author_id, project_id,
                   created_at, updated_at",
    )
    .bind(title)
    .bind(&page_slug)
    .bind(&payload.content)
    .bind(payload.is_public)
    .bind(user.id)
    .bind(project_id)
    .fetch_one(&mut *tx)
    .await?;

    // A request without a tag field is a deferred save as far as the tag
    // set is concerned.
    if let Some(tags_text) = payload.tags_text.as_deref() {
        tags::sync_tags(&mut tx, TagTarget::Page(page.id), tags_text).await?;
    }
    let page_tags = tags::tags_for(&mut *tx, TagTarget::Page(page.id)).await?;

    tx.commit().await?;

    Ok(Json(detail_response(
        page,
        user.username,
        project_slug,
        page_tags,
        Vec::new(),
        Vec::new(),
    )))
}

#[derive(Deserialize)]
pub struct UpdatePageRequest {
    pub title: String,
    pub content: Option<String>,
    pub tags_text: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

pub async fn update_page(
    State(pool): State<PgPool>,
    CurrentUser(user): CurrentUser,
    Path((project_slug, page_slug)): Path<(String, String)>,
    Json(payload): Json<UpdatePageRequest>,
) -> Result<Json<PageDetailResponse>, AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }

    let mut tx = pool.begin().await?;

    // Only the owning author may edit; anyone else sees a missing resource.
    let existing = sqlx::query_as::<_, Page>(
        "SELECT pg.id, pg.uuid, pg.title, pg.slug, pg.content, pg.is_public,
                pg.author_id, pg.project_id, pg.created_at, pg.updated_at
         FROM pages pg
         JOIN projects p ON p.id = pg.project_id
         WHERE pg.slug = $1 AND p.slug = $2 AND pg.author_id = $3",
    )
    .bind(&page_slug)
    .bind(&project_slug)
    .bind(user.id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound)?;

    let new_slug = slug::assign_slug(
        &mut *tx,
        SlugScope::Pages,
        title,
        Some(&existing.slug),
        Some(existing.uuid),
    )
    .await?;

    let page = sqlx::query_as::<_, Page>(
        "UPDATE pages
         SET title = $1, slug = $2, content = $3, is_public = $4, updated_at = $5
         WHERE id = $6
         RETURNING id, uuid, title, slug, content, is_public, author_id, project_id,
                   created_at, updated_at",
    )
    .bind(title)
    .bind(&new_slug)
    .bind(&payload.content)
    .bind(payload.is_public)
    .bind(Utc::now())
    .bind(existing.id)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(tags_text) = payload.tags_text.as_deref() {
        tags::sync_tags(&mut tx, TagTarget::Page(page.id), tags_text).await?;
    }
    let page_tags = tags::tags_for(&mut *tx, TagTarget::Page(page.id)).await?;
    let page_comments = comments::fetch_page_comments(&mut *tx, page.id).await?;
    let page_files = files::fetch_page_files(&mut *tx, page.id).await?;

    tx.commit().await?;

    Ok(Json(detail_response(
        page,
        user.username,
        project_slug,
        page_tags,
        page_comments,
        page_files,
    )))
}

pub async fn delete_page(
    State(pool): State<PgPool>,
    CurrentUser(user): CurrentUser,
    Path((project_slug, page_slug)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query(
        "DELETE FROM pages pg
         USING projects p
         WHERE pg.project_id = p.id
           AND pg.slug = $1 AND p.slug = $2 AND pg.author_id = $3",
    )
    .bind(&page_slug)
    .bind(&project_slug)
    .bind(user.id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

fn detail_response(
    page: Page,
    author: String,
    project_slug: String,
    page_tags: Vec<crate::models::Tag>,
    page_comments: Vec<comments::CommentResponse>,
    page_files: Vec<files::FileResponse>,
) -> PageDetailResponse {
    let tags_text = tags::join_tag_names(&page_tags);
    PageDetailResponse {
        uuid: page.uuid,
        title: page.title,
        slug: page.slug,
        content: page.content,
        is_public: page.is_public,
        author,
        project: project_slug,
        tags: page_tags.into_iter().map(|t| t.name).collect(),
        tags_text,
        created: page.created_at,
        updated: page.updated_at,
        comments: page_comments,
        files: page_files,
    }
}
