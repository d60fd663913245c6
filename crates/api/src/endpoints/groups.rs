//! Group endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use yatube_common::AppResult;
use yatube_core::{Page, PostView};
use yatube_db::{entities::group, repositories::PostFilter};

use crate::{extractors::PageParam, middleware::AppState, response::ApiResponse};

/// A group and a page of its posts.
#[derive(Serialize)]
pub struct GroupContext {
    pub group: group::Model,
    pub page_obj: Page<PostView>,
}

/// Posts filed under a group, newest first.
async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    PageParam(page): PageParam,
) -> AppResult<ApiResponse<GroupContext>> {
    let group = state.group_service.get_by_slug(&slug).await?;
    let page_obj = state
        .post_service
        .list(&PostFilter::Group(group.id.clone()), page)
        .await?;

    Ok(ApiResponse::ok(GroupContext { group, page_obj }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{slug}", get(group_posts))
}
