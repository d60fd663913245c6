//! API middleware.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use yatube_common::StorageBackend;
use yatube_core::{
    CommentService, FeedService, FollowService, GroupService, ListingService, PostService,
    UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub group_service: GroupService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub follow_service: FollowService,
    pub feed_service: FeedService,
    pub listing_service: ListingService,
    pub storage: Arc<dyn StorageBackend>,
    /// Upper bound for a single media upload, in bytes.
    pub max_upload_bytes: usize,
}

/// Authentication middleware.
///
/// Attaches the user behind a valid bearer token to the request. Requests
/// without one proceed anonymously.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate(token.trim()).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => tracing::debug!("Unknown access token"),
            Err(e) => tracing::warn!(error = %e, "Failed to authenticate request"),
        }
    }

    next.run(req).await
}
