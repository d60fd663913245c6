//! Following endpoints: the feed, follow and unfollow.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use yatube_common::AppResult;
use yatube_core::{AuthorSummary, FollowStatus};

use super::posts::ListingContext;
use crate::{
    extractors::{AuthUser, PageParam},
    middleware::AppState,
    response::ApiResponse,
};

/// Follow state after a follow or unfollow.
#[derive(Serialize)]
pub struct FollowResponse {
    pub author: AuthorSummary,
    pub following: bool,
}

impl From<FollowStatus> for FollowResponse {
    fn from(status: FollowStatus) -> Self {
        Self {
            author: AuthorSummary::from(&status.author),
            following: status.following,
        }
    }
}

/// Posts by followed authors.
async fn feed(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    PageParam(page): PageParam,
) -> AppResult<ApiResponse<ListingContext>> {
    let page_obj = state.feed_service.feed(&user, page).await?;
    Ok(ApiResponse::ok(ListingContext { page_obj }))
}

/// Follow an author.
pub(super) async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<FollowResponse>> {
    let status = state.follow_service.follow(&user, &username).await?;
    Ok(ApiResponse::ok(status.into()))
}

/// Unfollow an author.
pub(super) async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<FollowResponse>> {
    let status = state.follow_service.unfollow(&user, &username).await?;
    Ok(ApiResponse::ok(status.into()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/follow", get(feed))
}
