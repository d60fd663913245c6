//! HTTP API layer for yatube-rs.
//!
//! This crate exposes the blog over JSON:
//!
//! - **Endpoints**: listings, post detail and editing, comments, follows,
//!   media upload and administration
//! - **Extractors**: authentication and pagination
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, extract::DefaultBodyLimit, routing::get};

pub use endpoints::router;
pub use middleware::AppState;

/// Room for multipart framing around an upload.
const BODY_LIMIT_HEADROOM: usize = 64 * 1024;

/// Mount the API under `/api` with authentication and a JSON 404 fallback.
pub fn app(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(BODY_LIMIT_HEADROOM);

    Router::new()
        .route("/api/", get(endpoints::posts::index))
        .nest("/api", router())
        .fallback(endpoints::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
}
