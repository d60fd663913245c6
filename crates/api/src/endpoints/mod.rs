//! API endpoints.

mod admin;
mod following;
mod groups;
mod media;
pub mod posts;
mod users;

use axum::Router;
use yatube_common::AppError;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(posts::router())
        .merge(following::router())
        .nest("/group", groups::router())
        .nest("/profile", users::router())
        .nest("/media", media::router())
        .nest("/admin", admin::router())
        .fallback(not_found)
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("No such route".to_string())
}

/// Route of a post's detail view.
pub(crate) fn post_detail_path(post_id: &str) -> String {
    format!("/api/posts/{post_id}")
}
