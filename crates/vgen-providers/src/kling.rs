//! Kling AI image-to-video client.
//!
//! Every call is authenticated with a freshly signed HS256 JWT built from the
//! caller's access key and secret. The source image travels inline as
//! base64 inside the job body.

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vgen_models::{Credentials, GenerationTask, ProviderId, TaskStatus};
use vgen_storage::UploadStore;

use crate::config::KlingConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, download_to, ensure_success};
use crate::poll::poll_until_terminal;
use crate::provider::{expect_provider, VideoProvider};

/// Lifetime of a signed token.
const TOKEN_TTL_SECS: u64 = 1800;

/// Backdating of `nbf` to absorb clock skew.
const TOKEN_LEEWAY_SECS: u64 = 5;

/// Kling video generation provider.
pub struct KlingProvider {
    client: reqwest::Client,
    config: KlingConfig,
    store: UploadStore,
}

impl KlingProvider {
    /// Create a client writing clips into `store`.
    pub fn new(config: KlingConfig, store: UploadStore) -> ProviderResult<Self> {
        Ok(Self {
            client: build_client(config.http_timeout)?,
            config,
            store,
        })
    }

    pub fn config(&self) -> &KlingConfig {
        &self.config
    }

    async fn submit(&self, auth: &KlingAuth<'_>, image_b64: String, prompt: &str) -> ProviderResult<String> {
        let url = format!("{}/videos/image2video", self.config.base_url);
        let body = KlingVideoRequest {
            model_name: &self.config.model_name,
            mode: &self.config.mode,
            duration: self.config.duration_secs.to_string(),
            cfg_scale: self.config.cfg_scale,
            prompt,
            image: image_b64,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(auth.token()?)
            .json(&body)
            .send()
            .await?;

        let envelope: KlingEnvelope<KlingTaskData> = ensure_success(response).await?.json().await?;
        let data = envelope.into_data()?;

        data.task_id
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::MissingField("data.task_id"))
    }

    /// One status check, mapped onto a [`GenerationTask`].
    async fn check(&self, auth: &KlingAuth<'_>, task_id: &str) -> ProviderResult<GenerationTask> {
        let url = format!("{}/videos/image2video/{}", self.config.base_url, task_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(auth.token()?)
            .send()
            .await?;

        let envelope: KlingEnvelope<KlingTaskStatus> = ensure_success(response).await?.json().await?;
        let data = envelope.into_data()?;
        let task = GenerationTask::submitted(task_id);

        Ok(match data.task_status.as_str() {
            "submitted" => task,
            "processing" => task.with_status(TaskStatus::Processing),
            "succeed" => {
                let url = data
                    .task_result
                    .and_then(|r| r.videos.into_iter().next())
                    .map(|v| v.url)
                    .filter(|u| !u.is_empty())
                    .ok_or(ProviderError::MissingField("data.task_result.videos[0].url"))?;
                task.succeed(url)
            }
            "failed" => task.fail(
                data.task_status_msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ),
            other => {
                warn!(task_id, status = other, "Unrecognised Kling task status");
                task.with_status(TaskStatus::Processing)
            }
        })
    }
}

#[async_trait]
impl VideoProvider for KlingProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Kling
    }

    async fn generate(
        &self,
        image: &Path,
        prompt: &str,
        credentials: &Credentials,
    ) -> ProviderResult<PathBuf> {
        expect_provider(self.id(), credentials)?;
        let Credentials::Kling {
            access_key,
            secret_key,
        } = credentials
        else {
            return Err(ProviderError::auth("Kling credentials required"));
        };
        let auth = KlingAuth {
            access_key,
            secret_key,
        };

        let start = Instant::now();
        let image_b64 = STANDARD.encode(tokio::fs::read(image).await?);

        let task_id = self.submit(&auth, image_b64, prompt).await?;
        info!(task_id = %task_id, image = %image.display(), "Submitted Kling generation");

        let auth_ref = &auth;
        let id = task_id.as_str();
        let task = poll_until_terminal(self.config.poll, move || self.check(auth_ref, id)).await?;

        let url = match task.status {
            TaskStatus::Succeeded => task
                .result_url
                .ok_or(ProviderError::MissingField("data.task_result.videos[0].url"))?,
            _ => {
                return Err(ProviderError::TaskFailed(
                    task.error_message.unwrap_or_else(|| "Unknown error".to_string()),
                ))
            }
        };

        let dest = self.store.clip_path(&task_id);
        download_to(&self.client, &url, &dest).await?;

        debug!(
            task_id = %task_id,
            elapsed_secs = start.elapsed().as_secs(),
            "Kling clip ready"
        );
        Ok(dest)
    }
}

/// Signs a new token for every call.
struct KlingAuth<'a> {
    access_key: &'a str,
    secret_key: &'a str,
}

impl KlingAuth<'_> {
    fn token(&self) -> ProviderResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ProviderError::auth(format!("system clock error: {e}")))?
            .as_secs();
        sign_token(self.access_key, self.secret_key, now)
    }
}

/// Build the HS256 token Kling expects, issued at `now` (unix seconds).
pub(crate) fn sign_token(access_key: &str, secret_key: &str, now: u64) -> ProviderResult<String> {
    let claims = KlingClaims {
        iss: access_key.to_string(),
        exp: now + TOKEN_TTL_SECS,
        nbf: now.saturating_sub(TOKEN_LEEWAY_SECS),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret_key.as_bytes()),
    )
    .map_err(|e| ProviderError::auth(format!("JWT generation failed: {e}")))
}

#[derive(Debug, Serialize, Deserialize)]
struct KlingClaims {
    iss: String,
    exp: u64,
    nbf: u64,
}

#[derive(Debug, Serialize)]
struct KlingVideoRequest<'a> {
    model_name: &'a str,
    mode: &'a str,
    duration: String,
    cfg_scale: f32,
    prompt: &'a str,
    image: String,
}

/// `{code, message, data}` wrapper around every Kling response.
#[derive(Debug, Deserialize)]
struct KlingEnvelope<T> {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

impl<T> KlingEnvelope<T> {
    fn into_data(self) -> ProviderResult<T> {
        if self.code != 0 {
            return Err(ProviderError::api(
                200,
                format!("Kling error {}: {}", self.code, self.message),
            ));
        }
        self.data.ok_or(ProviderError::MissingField("data"))
    }
}

#[derive(Debug, Deserialize)]
struct KlingTaskData {
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KlingTaskStatus {
    task_status: String,
    #[serde(default)]
    task_status_msg: Option<String>,
    #[serde(default)]
    task_result: Option<KlingTaskResult>,
}

#[derive(Debug, Deserialize)]
struct KlingTaskResult {
    #[serde(default)]
    videos: Vec<KlingVideo>,
}

#[derive(Debug, Deserialize)]
struct KlingVideo {
    url: String,
}
