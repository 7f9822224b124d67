use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub uuid: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

#[derive(Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i32,
    pub uuid: Uuid,
    pub title: String,
    pub slug: String,
    pub cover_image: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub is_public: bool,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, sqlx::FromRow)]
pub struct Page {
    pub id: i32,
    pub uuid: Uuid,
    pub title: String,
    pub slug: String,
    pub content: Option<String>,
    pub is_public: bool,
    pub author_id: i32,
    pub project_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

