//! Profile endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use yatube_common::AppResult;
use yatube_core::{AuthorSummary, Page, PostView};
use yatube_db::repositories::PostFilter;

use super::following::{follow, unfollow};
use crate::{
    extractors::{MaybeAuthUser, PageParam},
    middleware::AppState,
    response::ApiResponse,
};

/// An author's profile.
#[derive(Serialize)]
pub struct ProfileContext {
    pub author: AuthorSummary,
    /// Whether the viewer follows the author.
    pub following: bool,
    pub page_obj: Page<PostView>,
}

/// An author and a page of their posts.
async fn profile(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    PageParam(page): PageParam,
) -> AppResult<ApiResponse<ProfileContext>> {
    let author = state.user_service.get_by_username(&username).await?;
    let following = state
        .follow_service
        .is_following(viewer.as_ref(), &author)
        .await?;
    let page_obj = state
        .post_service
        .list(&PostFilter::Author(author.id.clone()), page)
        .await?;

    Ok(ApiResponse::ok(ProfileContext {
        author: AuthorSummary::from(&author),
        following,
        page_obj,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{username}", get(profile))
        .route("/{username}/follow", axum::routing::post(follow))
        .route("/{username}/unfollow", axum::routing::post(unfollow))
}
