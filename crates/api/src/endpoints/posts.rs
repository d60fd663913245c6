//! Post endpoints: home listing, detail, create, edit and comments.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Serialize;
use yatube_common::AppResult;
use yatube_core::{
    CommentInput, CommentView, EditOutcome, FormDescriptor, Page, PostInput, PostView,
    comment_form,
};

use super::post_detail_path;
use crate::{
    extractors::{AuthUser, PageParam},
    middleware::AppState,
    response::ApiResponse,
};

/// A page of posts.
#[derive(Serialize)]
pub struct ListingContext {
    pub page_obj: Page<PostView>,
}

/// Post detail with its comments.
#[derive(Serialize)]
pub struct PostDetailContext {
    pub post: PostView,
    /// Comment form.
    pub form: FormDescriptor,
    pub comments: Vec<CommentView>,
}

/// Post form, empty or filled with the post being edited.
#[derive(Serialize)]
pub struct PostFormContext {
    pub form: FormDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostView>,
    pub is_edit: bool,
}

/// A single post.
#[derive(Serialize)]
pub struct PostContext {
    pub post: PostView,
}

/// A single comment.
#[derive(Serialize)]
pub struct CommentContext {
    pub comment: CommentView,
}

/// Home listing of all posts, served through the listing cache.
pub async fn index(
    State(state): State<AppState>,
    PageParam(page): PageParam,
) -> AppResult<ApiResponse<ListingContext>> {
    let page_obj = state.listing_service.index(page).await?;
    Ok(ApiResponse::ok(ListingContext { page_obj }))
}

/// A post with its comments, newest first.
async fn detail(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<ApiResponse<PostDetailContext>> {
    let post = state.post_service.get(&post_id).await?;
    let comments = state.comment_service.list_for_post(&post.id).await?;
    let form = comment_form(format!("{}/comment", post_detail_path(&post.id)));

    Ok(ApiResponse::ok(PostDetailContext {
        post,
        form,
        comments,
    }))
}

/// The empty post form.
async fn create_form(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PostFormContext>> {
    let form = state
        .post_service
        .create_form("/api/create".to_string())
        .await?;

    Ok(ApiResponse::ok(PostFormContext {
        form,
        post: None,
        is_edit: false,
    }))
}

/// Publish a post.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<PostInput>,
) -> AppResult<ApiResponse<PostContext>> {
    let post = state.post_service.create(&user, input).await?;
    Ok(ApiResponse::created(PostContext { post }))
}

/// The post form filled with the post's values. Non-authors are sent to the
/// detail view.
async fn edit_form(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let action = format!("{}/edit", post_detail_path(&post_id));

    match state.post_service.edit_form(&user, &post_id, action).await? {
        EditOutcome::Author((post, form)) => Ok(ApiResponse::ok(PostFormContext {
            form,
            post: Some(post),
            is_edit: true,
        })
        .into_response()),
        EditOutcome::NotAuthor => Ok(Redirect::to(&post_detail_path(&post_id)).into_response()),
    }
}

/// Edit a post. Non-authors are sent to the detail view and nothing changes.
async fn edit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(input): Json<PostInput>,
) -> AppResult<Response> {
    match state.post_service.edit(&user, &post_id, input).await? {
        EditOutcome::Author(post) => Ok(ApiResponse::ok(PostContext { post }).into_response()),
        EditOutcome::NotAuthor => Ok(Redirect::to(&post_detail_path(&post_id)).into_response()),
    }
}

/// Comment on a post.
async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(input): Json<CommentInput>,
) -> AppResult<ApiResponse<CommentContext>> {
    let comment = state.comment_service.add(&user, &post_id, input).await?;
    Ok(ApiResponse::created(CommentContext { comment }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/create", get(create_form).post(create))
        .route("/posts/{id}", get(detail))
        .route("/posts/{id}/edit", get(edit_form).post(edit))
        .route("/posts/{id}/comment", post(add_comment))
}
