//! Request and response bodies for the public HTTP API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use validator::Validate;

use crate::{CredentialError, Credentials, ProviderId, UnknownProvider, VideoId, VideoStatus};

/// Minimum number of prompts (and images) per generation request.
pub const MIN_PROMPTS: usize = 1;

/// Maximum number of prompts (and images) per generation request.
pub const MAX_PROMPTS: usize = 6;

fn default_provider() -> String {
    ProviderId::Kling.as_str().to_string()
}

/// Body of `POST /generate-video`.
///
/// `provider` stays a plain string so an unknown value surfaces as a
/// validation failure instead of a deserialization rejection.
#[derive(Clone, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoRequest {
    /// One prompt per uploaded image, in upload order.
    #[validate(length(min = 1, max = 6, message = "Number of prompts must be between 1 and 6"))]
    pub prompts: Vec<String>,

    #[serde(default = "default_provider")]
    pub provider: String,

    /// Kling access key, or a MiniMax API key overriding the server's.
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub access_key_secret: Option<String>,

    #[serde(default)]
    pub group_id: Option<String>,
}

impl fmt::Debug for GenerateVideoRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateVideoRequest")
            .field("prompts", &self.prompts)
            .field("provider", &self.provider)
            .field("group_id", &self.group_id)
            .finish_non_exhaustive()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl GenerateVideoRequest {
    /// Parse the requested provider.
    pub fn provider_id(&self) -> Result<ProviderId, UnknownProvider> {
        self.provider.parse()
    }

    /// Resolve the credential set for `provider`.
    ///
    /// Kling credentials come entirely from the request. MiniMax takes its
    /// group id from the request and its key from the request when present,
    /// otherwise from `fallback_api_key` (the server environment).
    pub fn credentials(
        &self,
        provider: ProviderId,
        fallback_api_key: Option<&str>,
    ) -> Result<Credentials, CredentialError> {
        match provider {
            ProviderId::Kling => {
                let access_key = non_blank(Some(&self.api_key))
                    .ok_or(CredentialError::MissingApiKey("Kling"))?;
                let secret_key = non_blank(self.access_key_secret.as_deref())
                    .ok_or(CredentialError::MissingSecret)?;
                Ok(Credentials::Kling {
                    access_key: access_key.to_string(),
                    secret_key: secret_key.to_string(),
                })
            }
            ProviderId::MiniMax => {
                let group_id = non_blank(self.group_id.as_deref())
                    .ok_or(CredentialError::MissingGroupId)?;
                let api_key = non_blank(Some(&self.api_key))
                    .or_else(|| non_blank(fallback_api_key))
                    .ok_or(CredentialError::MissingApiKey("Minimax"))?;
                Ok(Credentials::MiniMax {
                    api_key: api_key.to_string(),
                    group_id: group_id.to_string(),
                })
            }
        }
    }
}

/// Response of `POST /generate-video`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerateVideoResponse {
    pub message: String,
    pub status: VideoStatus,
    pub video_id: VideoId,
    pub provider: ProviderId,
}

impl GenerateVideoResponse {
    /// Provisional answer returned before any provider work completes.
    pub fn started(video_id: VideoId, provider: ProviderId) -> Self {
        Self {
            message: "Video generation started".to_string(),
            status: VideoStatus::Processing,
            video_id,
            provider,
        }
    }
}

/// Response of `POST /upload-images`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadImagesResponse {
    pub message: String,
    pub files: Vec<PathBuf>,
}

/// One entry of `GET /api-providers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProviderInfo {
    pub id: ProviderId,
    pub name: String,
}

impl From<ProviderId> for ProviderInfo {
    fn from(id: ProviderId) -> Self {
        Self {
            id,
            name: id.display_name().to_string(),
        }
    }
}

/// Response of `GET /api-providers`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderInfo>,
}
