//! MiniMax image-to-video client.
//!
//! The image is uploaded first and referenced by URL in the job. MiniMax
//! authenticates with a static bearer key and scopes jobs and files to a
//! group id.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vgen_models::{Credentials, GenerationTask, ProviderId, TaskStatus};
use vgen_storage::UploadStore;

use crate::config::MiniMaxConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, download_to, ensure_success};
use crate::poll::poll_until_terminal;
use crate::provider::{expect_provider, VideoProvider};

/// MiniMax video generation provider.
pub struct MiniMaxProvider {
    client: reqwest::Client,
    config: MiniMaxConfig,
    store: UploadStore,
}

struct MiniMaxAuth<'a> {
    api_key: &'a str,
    group_id: &'a str,
}

impl MiniMaxProvider {
    /// Create a client writing clips into `store`.
    pub fn new(config: MiniMaxConfig, store: UploadStore) -> ProviderResult<Self> {
        Ok(Self {
            client: build_client(config.http_timeout)?,
            config,
            store,
        })
    }

    pub fn config(&self) -> &MiniMaxConfig {
        &self.config
    }

    /// Upload the source image and return the URL MiniMax assigned to it.
    async fn upload_image(&self, auth: &MiniMaxAuth<'_>, image: &Path) -> ProviderResult<String> {
        let data = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str(image_mime(image))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/media/upload", self.config.base_url))
            .bearer_auth(auth.api_key)
            .multipart(form)
            .send()
            .await?;

        let upload: MiniMaxUploadResponse = ensure_success(response).await?.json().await?;
        check_base_resp(upload.base_resp.as_ref())?;

        upload
            .url
            .filter(|u| !u.is_empty())
            .ok_or(ProviderError::MissingField("url"))
    }

    async fn submit(&self, auth: &MiniMaxAuth<'_>, image_url: &str, prompt: &str) -> ProviderResult<String> {
        let body = MiniMaxVideoRequest {
            model: &self.config.model,
            prompt,
            first_frame_image: image_url,
            duration: self.config.duration_secs,
        };

        let response = self
            .client
            .post(format!("{}/video_generation", self.config.base_url))
            .query(&[("GroupId", auth.group_id)])
            .bearer_auth(auth.api_key)
            .json(&body)
            .send()
            .await?;

        let submitted: MiniMaxSubmitResponse = ensure_success(response).await?.json().await?;
        check_base_resp(submitted.base_resp.as_ref())?;

        submitted
            .task_id
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::MissingField("task_id"))
    }

    /// One status check. A finished task is resolved to its download URL
    /// before it is reported as succeeded.
    async fn check(&self, auth: &MiniMaxAuth<'_>, task_id: &str) -> ProviderResult<GenerationTask> {
        let response = self
            .client
            .get(format!("{}/query/video_generation", self.config.base_url))
            .query(&[("task_id", task_id)])
            .bearer_auth(auth.api_key)
            .send()
            .await?;

        let poll: MiniMaxPollResponse = ensure_success(response).await?.json().await?;
        let task = GenerationTask::submitted(task_id);

        match poll.status.as_deref().unwrap_or_default() {
            "Queueing" => Ok(task),
            "Preparing" | "Processing" => Ok(task.with_status(TaskStatus::Processing)),
            "Success" => {
                let file_id = poll
                    .file_id
                    .filter(|id| !id.is_empty())
                    .ok_or(ProviderError::MissingField("file_id"))?;
                let url = self.retrieve_file_url(auth, &file_id).await?;
                Ok(task.succeed(url))
            }
            "Fail" => Ok(task.fail(
                poll.base_resp
                    .map(|r| r.status_msg)
                    .filter(|m| !m.is_empty() && m != "success")
                    .unwrap_or_else(|| "Unknown error".to_string()),
            )),
            other => {
                check_base_resp(poll.base_resp.as_ref())?;
                warn!(task_id, status = other, "Unrecognised MiniMax task status");
                Ok(task.with_status(TaskStatus::Processing))
            }
        }
    }

    async fn retrieve_file_url(&self, auth: &MiniMaxAuth<'_>, file_id: &str) -> ProviderResult<String> {
        let response = self
            .client
            .get(format!("{}/files/retrieve", self.config.base_url))
            .query(&[("file_id", file_id), ("GroupId", auth.group_id)])
            .bearer_auth(auth.api_key)
            .send()
            .await?;

        let file: MiniMaxFileResponse = ensure_success(response).await?.json().await?;
        check_base_resp(file.base_resp.as_ref())?;

        file.file
            .and_then(|f| f.download_url)
            .filter(|u| !u.is_empty())
            .ok_or(ProviderError::MissingField("file.download_url"))
    }
}

#[async_trait]
impl VideoProvider for MiniMaxProvider {
    fn id(&self) -> ProviderId {
        ProviderId::MiniMax
    }

    async fn generate(
        &self,
        image: &Path,
        prompt: &str,
        credentials: &Credentials,
    ) -> ProviderResult<PathBuf> {
        expect_provider(self.id(), credentials)?;
        let Credentials::MiniMax { api_key, group_id } = credentials else {
            return Err(ProviderError::auth("Minimax credentials required"));
        };
        let auth = MiniMaxAuth { api_key, group_id };

        let start = Instant::now();
        let image_url = self.upload_image(&auth, image).await?;
        debug!(image = %image.display(), url = %image_url, "Uploaded image to MiniMax");

        let task_id = self.submit(&auth, &image_url, prompt).await?;
        info!(task_id = %task_id, image = %image.display(), "Submitted MiniMax generation");

        let auth_ref = &auth;
        let id = task_id.as_str();
        let task = poll_until_terminal(self.config.poll, move || self.check(auth_ref, id)).await?;

        let url = match task.status {
            TaskStatus::Succeeded => task
                .result_url
                .ok_or(ProviderError::MissingField("file.download_url"))?,
            _ => {
                return Err(ProviderError::TaskFailed(
                    task.error_message.unwrap_or_else(|| "Unknown error".to_string()),
                ))
            }
        };

        let dest = self.store.clip_path(&format!("minimax_{task_id}"));
        download_to(&self.client, &url, &dest).await?;

        debug!(
            task_id = %task_id,
            elapsed_secs = start.elapsed().as_secs(),
            "MiniMax clip ready"
        );
        Ok(dest)
    }
}

fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

fn check_base_resp(base: Option<&MiniMaxBaseResp>) -> ProviderResult<()> {
    match base {
        Some(b) if b.status_code != 0 => Err(ProviderError::api(
            200,
            format!("MiniMax error {}: {}", b.status_code, b.status_msg),
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
struct MiniMaxVideoRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    first_frame_image: &'a str,
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct MiniMaxBaseResp {
    #[serde(default)]
    status_code: i64,
    #[serde(default)]
    status_msg: String,
}

#[derive(Debug, Deserialize)]
struct MiniMaxUploadResponse {
    url: Option<String>,
    base_resp: Option<MiniMaxBaseResp>,
}

#[derive(Debug, Deserialize)]
struct MiniMaxSubmitResponse {
    task_id: Option<String>,
    base_resp: Option<MiniMaxBaseResp>,
}

#[derive(Debug, Deserialize)]
struct MiniMaxPollResponse {
    status: Option<String>,
    file_id: Option<String>,
    base_resp: Option<MiniMaxBaseResp>,
}

#[derive(Debug, Deserialize)]
struct MiniMaxFileResponse {
    file: Option<MiniMaxFile>,
    base_resp: Option<MiniMaxBaseResp>,
}

#[derive(Debug, Deserialize)]
struct MiniMaxFile {
    download_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::PollPolicy;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;
    use vgen_storage::StoreConfig;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(max_polls: u32) -> (MockServer, TempDir, MiniMaxProvider) {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(StoreConfig {
            root: dir.path().to_path_buf(),
        });
        let config = MiniMaxConfig::default()
            .with_base_url(server.uri())
            .with_poll(PollPolicy::new(Duration::from_millis(1), max_polls));
        (server, dir, MiniMaxProvider::new(config, store).unwrap())
    }

    fn creds() -> Credentials {
        Credentials::MiniMax {
            api_key: "mm-key".into(),
            group_id: "grp-9".into(),
        }
    }

    fn image(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("beach.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();
        path
    }

    async fn mount_upload_and_submit(server: &MockServer, task_id: &str) {
        Mock::given(method("POST"))
            .and(path("/media/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": "https://files.minimax/beach.jpg"
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/video_generation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_id": task_id,
                "base_resp": {"status_code": 0, "status_msg": "success"}
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime(Path::new("a.PNG")), "image/png");
        assert_eq!(image_mime(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(image_mime(Path::new("noext")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_generate_full_flow() {
        let (server, dir, provider) = setup(10).await;
        let img = image(&dir);

        Mock::given(method("POST"))
            .and(path("/media/upload"))
            .and(header("authorization", "Bearer mm-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": "https://files.minimax/beach.jpg"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/video_generation"))
            .and(query_param("GroupId", "grp-9"))
            .and(body_partial_json(json!({
                "model": "video-01",
                "prompt": "waves at sunset",
                "first_frame_image": "https://files.minimax/beach.jpg",
                "duration": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_id": "mm-1",
                "base_resp": {"status_code": 0, "status_msg": "success"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        for status in ["Queueing", "Preparing", "Processing"] {
            Mock::given(method("GET"))
                .and(path("/query/video_generation"))
                .and(query_param("task_id", "mm-1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "task_id": "mm-1",
                    "status": status
                })))
                .up_to_n_times(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/query/video_generation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_id": "mm-1",
                "status": "Success",
                "file_id": "f-77",
                "base_resp": {"status_code": 0, "status_msg": "success"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/files/retrieve"))
            .and(query_param("file_id", "f-77"))
            .and(query_param("GroupId", "grp-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "file": {"file_id": "f-77", "download_url": format!("{}/dl/mm-1.mp4", server.uri())}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/dl/mm-1.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"minimax-clip".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let clip = provider.generate(&img, "waves at sunset", &creds()).await.unwrap();

        assert_eq!(clip, dir.path().join("temp_minimax_mm-1.mp4"));
        assert_eq!(std::fs::read(&clip).unwrap(), b"minimax-clip");
    }

    #[tokio::test]
    async fn test_fail_status_uses_base_resp_message() {
        let (server, dir, provider) = setup(5).await;
        let img = image(&dir);
        mount_upload_and_submit(&server, "mm-2").await;

        Mock::given(method("GET"))
            .and(path("/query/video_generation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Fail",
                "base_resp": {"status_code": 1026, "status_msg": "prompt contains sensitive content"}
            })))
            .mount(&server)
            .await;

        let err = provider.generate(&img, "x", &creds()).await.unwrap_err();
        assert!(matches!(err, ProviderError::TaskFailed(ref m) if m.contains("sensitive")));
    }

    #[tokio::test]
    async fn test_timeout_after_max_polls() {
        let (server, dir, provider) = setup(3).await;
        let img = image(&dir);
        mount_upload_and_submit(&server, "mm-3").await;

        Mock::given(method("GET"))
            .and(path("/query/video_generation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Processing"})))
            .expect(3)
            .mount(&server)
            .await;

        let err = provider.generate(&img, "x", &creds()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout { polls: 3, .. }));
    }

    #[tokio::test]
    async fn test_submit_error_base_resp() {
        let (server, dir, provider) = setup(3).await;
        let img = image(&dir);

        Mock::given(method("POST"))
            .and(path("/media/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": "https://f/x.jpg"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/video_generation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_id": "",
                "base_resp": {"status_code": 1004, "status_msg": "authentication failed"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider.generate(&img, "x", &creds()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { ref message, .. } if message.contains("1004")));
    }

    #[tokio::test]
    async fn test_upload_without_url_is_missing_field() {
        let (server, dir, provider) = setup(3).await;
        let img = image(&dir);

        Mock::given(method("POST"))
            .and(path("/media/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = provider.generate(&img, "x", &creds()).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingField("url")));
    }

    #[tokio::test]
    async fn test_success_without_file_id_is_missing_field() {
        let (server, dir, provider) = setup(3).await;
        let img = image(&dir);
        mount_upload_and_submit(&server, "mm-4").await;

        Mock::given(method("GET"))
            .and(path("/query/video_generation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Success"})))
            .mount(&server)
            .await;

        let err = provider.generate(&img, "x", &creds()).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingField("file_id")));
    }

    #[tokio::test]
    async fn test_kling_credentials_rejected_without_calls() {
        let (server, dir, provider) = setup(3).await;
        let img = image(&dir);
        let kling = Credentials::Kling {
            access_key: "ak".into(),
            secret_key: "sk".into(),
        };

        let err = provider.generate(&img, "x", &kling).await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
