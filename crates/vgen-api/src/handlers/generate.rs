//! Video generation handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::info;
use validator::Validate;
use vgen_media::FfmpegRunner;
use vgen_models::{GenerateVideoRequest, GenerateVideoResponse, VideoId};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::GenerationJob;
use crate::state::AppState;

/// Start generating one video from the latest uploads.
///
/// Everything that can be rejected is checked before any provider call:
/// prompt count, provider name, provider availability, credentials, and
/// that exactly one uploaded image exists per prompt. Generation and merge
/// then continue in the background and the response only carries the id
/// the finished video will be served under.
pub async fn generate_video(
    State(state): State<AppState>,
    body: Result<Json<GenerateVideoRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateVideoResponse>> {
    let Json(request) = body?;
    request.validate()?;

    let provider_id = request.provider_id()?;
    let provider = state.providers.get(provider_id).ok_or_else(|| {
        ApiError::internal(format!("{} API not configured", provider_id.display_name()))
    })?;

    let credentials =
        request.credentials(provider_id, state.providers.fallback_api_key(provider_id))?;

    let images = state.store.latest_images(request.prompts.len()).await?;
    if images.len() != request.prompts.len() {
        return Err(ApiError::bad_request(
            "Number of images does not match number of prompts",
        ));
    }

    let video_id = VideoId::new();
    let job = GenerationJob {
        output: state.store.final_video_path(&video_id),
        video_id: video_id.clone(),
        provider,
        images: images.into_iter().map(|img| img.path).collect(),
        prompts: request.prompts,
        credentials,
        runner: FfmpegRunner::new().with_timeout(state.config.merge_timeout_secs),
    };

    info!(
        video_id = %video_id,
        provider = %provider_id,
        prompts = job.prompts.len(),
        "Video generation started"
    );
    metrics::record_generation_started(provider_id.as_str());
    job.spawn();

    Ok(Json(GenerateVideoResponse::started(video_id, provider_id)))
}
