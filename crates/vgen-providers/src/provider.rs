//! Video provider trait and batch generation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};
use vgen_models::{Credentials, ProviderId};

use crate::error::{ProviderError, ProviderResult};

/// An image-to-video backend.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Human-readable name.
    fn name(&self) -> &'static str {
        self.id().display_name()
    }

    /// Turn one image and one prompt into a clip in the uploads directory.
    ///
    /// Returns the clip's path. `credentials` must belong to this provider.
    async fn generate(
        &self,
        image: &Path,
        prompt: &str,
        credentials: &Credentials,
    ) -> ProviderResult<PathBuf>;
}

/// Batch helpers available on every provider.
#[async_trait]
pub trait VideoProviderExt: VideoProvider {
    /// Generate one clip per `(image, prompt)` pair, in order.
    ///
    /// Items run one after another. A failed item is logged and skipped;
    /// the call only fails when the inputs do not pair up or when no item
    /// produced a clip.
    async fn generate_many(
        &self,
        images: &[PathBuf],
        prompts: &[String],
        credentials: &Credentials,
    ) -> ProviderResult<Vec<PathBuf>> {
        if images.len() != prompts.len() {
            return Err(ProviderError::invalid_request(format!(
                "{} images for {} prompts",
                images.len(),
                prompts.len()
            )));
        }

        let mut clips = Vec::with_capacity(images.len());
        let mut last_error = None;

        for (index, (image, prompt)) in images.iter().zip(prompts).enumerate() {
            match self.generate(image, prompt, credentials).await {
                Ok(clip) => {
                    info!(
                        provider = %self.id(),
                        index,
                        clip = %clip.display(),
                        "Clip generated"
                    );
                    clips.push(clip);
                }
                Err(e) => {
                    warn!(
                        provider = %self.id(),
                        index,
                        image = %image.display(),
                        error = %e,
                        "Clip generation failed, continuing with next image"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if clips.is_empty() => Err(ProviderError::NoClipsGenerated {
                attempted: images.len(),
                last_error: e.to_string(),
            }),
            _ if clips.is_empty() => Err(ProviderError::invalid_request("no images to generate from")),
            _ => Ok(clips),
        }
    }
}

impl<T: VideoProvider + ?Sized> VideoProviderExt for T {}

/// Reject credentials that belong to another provider.
pub(crate) fn expect_provider(expected: ProviderId, credentials: &Credentials) -> ProviderResult<()> {
    if credentials.provider() == expected {
        Ok(())
    } else {
        Err(ProviderError::auth(format!(
            "{} credentials cannot be used with {}",
            credentials.provider().display_name(),
            expected.display_name()
        )))
    }
}
