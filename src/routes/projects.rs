use crate::{
    error::AppError,
    extractors::CurrentUser,
    models::Project,
    params::SearchParams,
    routes::pages::{self, PageSummary},
    slug::{self, SlugScope},
    tags::{self, TagTarget},
    text,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ProjectSort {
    Created,
    Updated,
    Title,
}

impl ProjectSort {
    fn column(params: Option<&Self>) -> &'static str {
        match params {
            Some(ProjectSort::Title) => "p.title",
            Some(ProjectSort::Created) => "p.created_at",
            _ => "p.updated_at",
        }
    }
}

const PROJECT_COLUMNS: &str = "p.id, p.uuid, p.title, p.slug, p.cover_image, p.description, \
     p.icon, p.is_public, p.created_at, p.updated_at, u.username AS author";

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: i32,
    uuid: Uuid,
    title: String,
    slug: String,
    cover_image: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    is_public: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author: String,
}

#[derive(Serialize)]
pub struct ProjectResponse {
    uuid: Uuid,
    title: String,
    slug: String,
    summary: String,
    cover_image: Option<String>,
    icon: Option<String>,
    is_public: bool,
    author: String,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

impl From<ProjectRow> for ProjectResponse {
    fn from(row: ProjectRow) -> Self {
        Self {
            uuid: row.uuid,
            title: row.title,
            slug: row.slug,
            summary: text::clean_description(
                row.description.as_deref().unwrap_or(""),
                text::DEFAULT_SUMMARY_CHARS,
            ),
            cover_image: row.cover_image,
            icon: row.icon,
            is_public: row.is_public,
            author: row.author,
            created: row.created_at,
            updated: row.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct ProjectDetailResponse {
    pub uuid: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub icon: Option<String>,
    pub is_public: bool,
    pub author: String,
    pub tags: Vec<String>,
    pub tags_text: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub pages: Vec<PageSummary>,
}

/// List projects. With `q`, filters on a case-insensitive substring match
/// against title, description, author username, or any attached tag name,
/// OR-combined and deduplicated; without it, plain listing. An empty `q`
/// is treated as absent.
pub async fn get_projects(
    State(pool): State<PgPool>,
    Query(params): Query<SearchParams<ProjectSort>>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let column = ProjectSort::column(params.sort());
    let direction = params.sort_by().to_sql();

    let rows = if let Some(q) = params.query() {
        let query = format!(
            "SELECT DISTINCT {PROJECT_COLUMNS}
            FROM projects p
            JOIN users u ON u.id = p.author_id
            LEFT JOIN project_tags pt ON pt.project_id = p.id
            LEFT JOIN tags t ON t.id = pt.tag_id
            WHERE p.title ILIKE $1
               OR p.description ILIKE $1
               OR u.username ILIKE $1
               OR t.name ILIKE $1
            ORDER BY {column} {direction}
            LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(format!("%{q}%"))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&pool)
            .await?
    } else {
        let query = format!(
            "SELECT {PROJECT_COLUMNS}
            FROM projects p
            JOIN users u ON u.id = p.author_id
            ORDER BY {column} {direction}
            LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&pool)
            .await?
    };

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// The three most recently updated public projects, for the landing page.
pub async fn get_recent_projects(
    State(pool): State<PgPool>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let query = format!(
        "SELECT {PROJECT_COLUMNS}
        FROM projects p
        JOIN users u ON u.id = p.author_id
        WHERE p.is_public = TRUE
        ORDER BY p.updated_at DESC
        LIMIT 3"
    );
    let rows = sqlx::query_as::<_, ProjectRow>(&query)
        .fetch_all(&pool)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// The caller's own projects.
pub async fn dashboard(
    State(pool): State<PgPool>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let query = format!(
        "SELECT {PROJECT_COLUMNS}
        FROM projects p
        JOIN users u ON u.id = p.author_id
        WHERE p.author_id = $1
        ORDER BY p.updated_at DESC"
    );
    let rows = sqlx::query_as::<_, ProjectRow>(&query)
        .bind(user.id)
        .fetch_all(&pool)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn get_one_project(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
) -> Result<Json<ProjectDetailResponse>, AppError> {
    let query = format!(
        "SELECT {PROJECT_COLUMNS}
        FROM projects p
        JOIN users u ON u.id = p.author_id
        WHERE p.slug = $1"
    );
    let row = sqlx::query_as::<_, ProjectRow>(&query)
        .bind(&slug)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let project_tags = tags::tags_for(&pool, TagTarget::Project(row.id)).await?;
    let project_pages = pages::fetch_project_pages(&pool, row.id).await?;

    Ok(Json(detail_response(row, project_tags, project_pages)))
}

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: Option<String>,
    pub tags_text: Option<String>,
    pub cover_image: Option<String>,
    pub icon: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

pub async fn create_project(
    State(pool): State<PgPool>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<Json<ProjectDetailResponse>, AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }

    let mut tx = pool.begin().await?;

    let slug = slug::assign_slug(&mut *tx, SlugScope::Projects, title, None, None).await?;

    let project = sqlx::query_as::<_, Project>(
        "INSERT INTO projects (title, slug, cover_image, description, icon, is_public, author_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id, uuid, title, slug, cover_image, description, icon, is_public,
                   author_id, created_at, updated_at",
    )
    .bind(title)
    .bind(&slug)
    .bind(&payload.cover_image)
    .bind(&payload.description)
    .bind(&payload.icon)
    .bind(payload.is_public)
    .bind(user.id)
    .fetch_one(&mut *tx)
    .await?;

    tags::sync_tags(
        &mut tx,
        TagTarget::Project(project.id),
        payload.tags_text.as_deref().unwrap_or(""),
    )
    .await?;
    let project_tags = tags::tags_for(&mut *tx, TagTarget::Project(project.id)).await?;

    tx.commit().await?;

    Ok(Json(detail_response(
        owned_row(project, user.username),
        project_tags,
        Vec::new(),
    )))
}

#[derive(Deserialize)]
pub struct UpdateProjectRequest {
    pub title: String,
    pub description: Option<String>,
    pub tags_text: Option<String>,
    pub cover_image: Option<String>,
    pub icon: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

pub async fn update_project(
    State(pool): State<PgPool>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectDetailResponse>, AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }

    let mut tx = pool.begin().await?;

    // Only the owning author may edit; anyone else sees a missing resource.
    let existing = sqlx::query_as::<_, Project>(
        "SELECT id, uuid, title, slug, cover_image, description, icon, is_public,
                author_id, created_at, updated_at
         FROM projects WHERE slug = $1 AND author_id = $2",
    )
    .bind(&slug)
    .bind(user.id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound)?;

    // The slug is kept, not recomputed from the new title; uniqueness is
    // still re-validated against other rows.
    let new_slug = slug::assign_slug(
        &mut *tx,
        SlugScope::Projects,
        title,
        Some(&existing.slug),
        Some(existing.uuid),
    )
    .await?;

    let project = sqlx::query_as::<_, Project>(
        "UPDATE projects
         SET title = $1, slug = $2, cover_image = $3, description = $4, icon = $5,
             is_public = $6, updated_at = $7
         WHERE id = $8
         RETURNING id, uuid, title, slug, cover_image, description, icon, is_public,
                   author_id, created_at, updated_at",
    )
    .bind(title)
    .bind(&new_slug)
    .bind(&payload.cover_image)
    .bind(&payload.description)
    .bind(&payload.icon)
    .bind(payload.is_public)
    .bind(Utc::now())
    .bind(existing.id)
    .fetch_one(&mut *tx)
    .await?;

    tags::sync_tags(
        &mut tx,
        TagTarget::Project(project.id),
        payload.tags_text.as_deref().unwrap_or(""),
    )
    .await?;
    let project_tags = tags::tags_for(&mut *tx, TagTarget::Project(project.id)).await?;
    let project_pages = pages::fetch_project_pages(&mut *tx, project.id).await?;

    tx.commit().await?;

    Ok(Json(detail_response(
        owned_row(project, user.username),
        project_tags,
        project_pages,
    )))
}

pub async fn delete_project(
    State(pool): State<PgPool>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM projects WHERE slug = $1 AND author_id = $2")
        .bind(&slug)
        .bind(user.id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

fn owned_row(project: Project, author: String) -> ProjectRow {
    ProjectRow {
        id: project.id,
        uuid: project.uuid,
        title: project.title,
        slug: project.slug,
        cover_image: project.cover_image,
        description: project.description,
        icon: project.icon,
        is_public: project.is_public,
        created_at: project.created_at,
        updated_at: project.updated_at,
        author,
    }
}

fn detail_response(
    row: ProjectRow,
    project_tags: Vec<crate::models::Tag>,
    project_pages: Vec<PageSummary>,
) -> ProjectDetailResponse {
    let tags_text = tags::join_tag_names(&project_tags);
    ProjectDetailResponse {
        uuid: row.uuid,
        title: row.title,
        slug: row.slug,
        description: row.description,
        cover_image: row.cover_image,
        icon: row.icon,
        is_public: row.is_public,
        author: row.author,
        tags: project_tags.into_iter().map(|t| t.name).collect(),
        tags_text,
        created: row.created_at,
        updated: row.updated_at,
        pages: project_pages,
    }
}
