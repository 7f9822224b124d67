use crate::{error::AppError, params::PaginationParams};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Serialize)]
pub struct TagResponse {
    pub name: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct TagListParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    pub q: Option<String>,
}

pub async fn fetch_tags(
    State(pool): State<PgPool>,
    Query(params): Query<TagListParams>,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    let search_pattern = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{q}%"));

    let tags = sqlx::query_as::<_, (String,)>(
        "SELECT name FROM tags
         WHERE ($3::TEXT IS NULL OR name ILIKE $3)
         ORDER BY name ASC
         LIMIT $1 OFFSET $2",
    )
    .bind(params.pagination.limit())
    .bind(params.pagination.offset())
    .bind(search_pattern)
    .fetch_all(&pool)
    .await?
    .into_iter()
    .map(|(name,)| TagResponse { name })
    .collect();

    Ok(Json(tags))
}
