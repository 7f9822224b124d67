pub mod comments;
pub mod files;
pub mod pages;
pub mod projects;
pub mod tags;
pub mod users;

use crate::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/projects", project_routes())
        .nest("/api/comments", comment_routes())
        .nest("/api/files", file_routes())
        .nest("/api/tags", tag_routes())
        .nest("/api/users", user_routes())
        .route("/api/dashboard", get(projects::dashboard))
        .with_state(state)
}

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(projects::get_projects).post(projects::create_project),
        )
        .route("/recent", get(projects::get_recent_projects))
        .route(
            "/{slug}",
            get(projects::get_one_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/{slug}/pages",
            get(pages::get_pages).post(pages::create_page),
        )
        .route(
            "/{slug}/pages/{page_slug}",
            get(pages::get_one_page)
                .put(pages::update_page)
                .delete(pages::delete_page),
        )
}

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(comments::get_comments).post(comments::create_comment),
        )
        .route("/{uuid}", axum::routing::delete(comments::delete_comment))
}

pub fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(files::get_files).post(files::create_file))
        .route("/{uuid}", axum::routing::delete(files::delete_file))
}

pub fn tag_routes() -> Router<AppState> {
    Router::new().route("/", get(tags::fetch_tags))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(users::register))
        .route("/me", get(users::me))
}
