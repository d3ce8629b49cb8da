//! Finished video delivery.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use vgen_models::VideoId;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Serve a merged video (`GET` and `HEAD`, byte ranges supported).
///
/// Unknown ids, ids that are not plain file-name tokens, and videos still
/// being merged all answer 404.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    request: Request<Body>,
) -> ApiResult<Response> {
    let path = state.store.find_final_video(&VideoId::from(video_id)).await?;

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .map_err(|e| ApiError::internal(format!("failed to serve video: {e}")))?;

    Ok(response.into_response())
}
