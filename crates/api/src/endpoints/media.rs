//! Media upload endpoint for post images.

use axum::{
    Router,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    routing::post,
};
use serde::Serialize;
use yatube_common::{AppError, AppResult, generate_storage_key};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Stored image, to be passed as the `image` of a post.
#[derive(Serialize)]
pub struct MediaResponse {
    pub key: String,
    pub url: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
    pub md5: String,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

fn invalid_image() -> AppError {
    AppError::InvalidField {
        field: "image",
        message: "Upload a valid image. The file you uploaded was either not an image or a corrupted image.".to_string(),
    }
}

/// Upload an image via multipart form (field `image`).
async fn upload(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<MediaResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("image") {
            continue;
        }

        file_name = field.file_name().map(ToString::to_string);
        content_type = field.content_type().map(ToString::to_string);
        file_data = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
    }

    let data = file_data.ok_or_else(|| AppError::InvalidField {
        field: "image",
        message: "No file was submitted.".to_string(),
    })?;
    let content_type = content_type
        .filter(|ct| ct.starts_with("image/"))
        .ok_or_else(invalid_image)?;

    if data.is_empty() {
        return Err(AppError::InvalidField {
            field: "image",
            message: "The submitted file is empty.".to_string(),
        });
    }
    if data.len() > state.max_upload_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "Images are limited to {} bytes",
            state.max_upload_bytes
        )));
    }

    let name = file_name.unwrap_or_else(|| "image".to_string());
    let key = generate_storage_key(&user.id, &name);
    let file = state.storage.upload(&key, &data, &content_type).await?;

    Ok(ApiResponse::created(MediaResponse {
        key: file.key,
        url: file.url,
        content_type: file.content_type,
        size: file.size,
        md5: file.md5,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload))
}
