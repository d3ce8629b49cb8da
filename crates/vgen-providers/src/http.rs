//! HTTP plumbing shared by the provider clients.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};

/// Longest upstream error body carried into an error message.
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn build_client(timeout: Duration) -> ProviderResult<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("vgen/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Pass a 2xx response through, turn anything else into an error.
pub(crate) async fn ensure_success(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = truncate(body.trim());

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::auth(message),
        _ => ProviderError::api(status.as_u16(), message),
    })
}

/// Stream `url` into `dest`, returning the number of bytes written.
///
/// A partially written file is removed on failure.
pub(crate) async fn download_to(client: &Client, url: &str, dest: &Path) -> ProviderResult<u64> {
    let result = async {
        let mut response = ensure_success(client.get(url).send().await?).await?;
        let mut file = File::create(dest).await?;
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok::<_, ProviderError>(written)
    }
    .await;

    match result {
        Ok(written) => {
            debug!(dest = %dest.display(), bytes = written, "Clip downloaded");
            Ok(written)
        }
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(dest).await {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial clip {}: {}", dest.display(), rm);
                }
            }
            Err(e)
        }
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short"), "short");
        let long = "é".repeat(400);
        let cut = truncate(&long);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= MAX_ERROR_BODY + 3);
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("temp_1.mp4");
        let client = build_client(Duration::from_secs(5)).unwrap();

        let written = download_to(&client, &format!("{}/clip.mp4", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, 9);
        assert_eq!(std::fs::read(&dest).unwrap(), b"mp4-bytes");
    }

    #[tokio::test]
    async fn test_download_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("temp_2.mp4");
        let client = build_client(Duration::from_secs(5)).unwrap();

        let err = download_to(&client, &format!("{}/clip.mp4", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Api { status: 404, ref message } if message == "gone"));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_auth_statuses_map_to_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5)).unwrap();
        let response = client.get(server.uri()).send().await.unwrap();
        let err = ensure_success(response).await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(_)));
    }
}
