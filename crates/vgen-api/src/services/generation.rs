//! Background generation pipeline: clips from the provider, then one merge.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, Instrument};
use vgen_media::{merge_clips_with, FfmpegRunner, MediaError, MergeSummary};
use vgen_models::{Credentials, VideoId};
use vgen_providers::{ProviderError, VideoProvider, VideoProviderExt};

use crate::metrics;

/// Failure of a background generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("clip generation failed: {0}")]
    Generate(#[from] ProviderError),

    #[error("merge failed: {0}")]
    Merge(#[from] MediaError),
}

impl GenerationError {
    fn stage(&self) -> &'static str {
        match self {
            GenerationError::Generate(_) => "generate",
            GenerationError::Merge(_) => "merge",
        }
    }
}

/// Everything one request needs once it leaves the handler.
pub struct GenerationJob {
    pub video_id: VideoId,
    pub provider: Arc<dyn VideoProvider>,
    pub images: Vec<PathBuf>,
    pub prompts: Vec<String>,
    pub credentials: Credentials,
    /// Where the merged video is published
    pub output: PathBuf,
    pub runner: FfmpegRunner,
}

impl GenerationJob {
    /// Generate every clip and merge them into `output`.
    pub async fn run(self) -> Result<MergeSummary, GenerationError> {
        let provider_id = self.provider.id();

        let clips = self
            .provider
            .generate_many(&self.images, &self.prompts, &self.credentials)
            .await?;
        metrics::record_clips(
            provider_id.as_str(),
            clips.len(),
            self.images.len() - clips.len(),
        );

        info!(
            clips = clips.len(),
            requested = self.images.len(),
            "Clips ready, merging"
        );

        let summary = merge_clips_with(&self.runner, &clips, &self.output).await?;
        metrics::record_merge_duration(summary.clip_count, summary.elapsed_ms as f64 / 1000.0);

        Ok(summary)
    }

    /// Run on the runtime without waiting; the outcome is only logged.
    pub fn spawn(self) -> JoinHandle<()> {
        let provider = self.provider.id();
        let span = tracing::info_span!(
            "generation",
            video_id = %self.video_id,
            provider = %provider
        );

        tokio::spawn(
            async move {
                match self.run().await {
                    Ok(summary) => {
                        metrics::record_generation_completed(provider.as_str());
                        info!(
                            output = %summary.output.display(),
                            clips = summary.clip_count,
                            duration_secs = ?summary.duration_secs,
                            "Video generation completed"
                        );
                    }
                    Err(e) => {
                        metrics::record_generation_failed(provider.as_str(), e.stage());
                        error!(error = %e, "Video generation failed");
                    }
                }
            }
            .instrument(span),
        )
    }
}
