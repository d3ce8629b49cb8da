//! Image upload handler.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;
use vgen_models::{UploadImagesResponse, MAX_PROMPTS, MIN_PROMPTS};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Multipart field carrying the images.
const FILES_FIELD: &str = "files";

/// Save 1 to 6 images from the `files` multipart field.
///
/// The whole form is read and checked before anything is written, and a
/// save that fails midway removes the files already written, so a rejected
/// request leaves no files behind.
pub async fn upload_images(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadImagesResponse>> {
    let mut multipart = multipart?;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let name = field.file_name().map(str::to_string);
        let data = field.bytes().await?;
        files.push((name, data));

        if files.len() > MAX_PROMPTS {
            break;
        }
    }

    if !(MIN_PROMPTS..=MAX_PROMPTS).contains(&files.len()) {
        return Err(ApiError::bad_request(format!(
            "Number of images must be between {MIN_PROMPTS} and {MAX_PROMPTS}"
        )));
    }

    if let Some((name, _)) = files.iter().find(|(_, data)| data.is_empty()) {
        return Err(ApiError::bad_request(format!(
            "Uploaded file is empty: {}",
            name.as_deref().unwrap_or("<unnamed>")
        )));
    }

    let mut saved = Vec::with_capacity(files.len());
    for (name, data) in &files {
        match state.store.save_upload(name.as_deref(), data).await {
            Ok(path) => saved.push(path),
            Err(e) => {
                state.store.discard(&saved).await;
                return Err(e.into());
            }
        }
    }

    info!(count = saved.len(), "Images uploaded");
    metrics::record_images_uploaded(saved.len());

    Ok(Json(UploadImagesResponse {
        message: "Images uploaded successfully".to_string(),
        files: saved,
    }))
}
