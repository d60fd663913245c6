//! Administrative endpoints: authors, groups and the listing cache.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, post},
};
use serde::Serialize;
use yatube_common::AppResult;
use yatube_core::{CreateGroupInput, ProvisionUserInput};
use yatube_db::entities::{group, user};

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{self, ApiResponse},
};

/// A provisioned author with their access token.
#[derive(Serialize)]
pub struct ProvisionedUserResponse {
    #[serde(flatten)]
    pub user: user::Model,
    pub token: Option<String>,
}

/// Provision an author.
async fn create_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<ProvisionUserInput>,
) -> AppResult<ApiResponse<ProvisionedUserResponse>> {
    let user = state.user_service.provision(input).await?;
    tracing::info!(admin = %admin.username, username = %user.username, "Admin provisioned user");

    Ok(ApiResponse::created(ProvisionedUserResponse {
        token: user.token.clone(),
        user,
    }))
}

/// Delete an author with their posts, comments and follows.
async fn delete_user(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.user_service.delete(&username).await?;
    Ok(response::ok())
}

/// Create a group.
async fn create_group(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateGroupInput>,
) -> AppResult<ApiResponse<group::Model>> {
    let group = state.group_service.create(input).await?;
    Ok(ApiResponse::created(group))
}

/// Delete a group. Its posts stay, without a group.
async fn delete_group(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.group_service.delete(&slug).await?;
    Ok(response::ok())
}

/// Drop every cached home listing page.
async fn flush_cache(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.listing_service.flush().await?;
    tracing::info!(admin = %admin.username, "Admin flushed listing cache");
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{username}", delete(delete_user))
        .route("/groups", post(create_group))
        .route("/groups/{slug}", delete(delete_group))
        .route("/cache/flush", post(flush_cache))
}
