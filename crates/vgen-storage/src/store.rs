//! Uploads directory implementation.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use vgen_models::{UploadedImage, VideoId};

use crate::error::{StorageError, StorageResult};

/// File name prefix of intermediate provider clips.
pub const CLIP_PREFIX: &str = "temp_";

/// Extension of every video file written to the directory.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Suffix of a merge output that is still being written.
const PARTIAL_SUFFIX: &str = ".part";

/// Configuration for the uploads directory.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding images, clips and final videos
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("uploads"),
        }
    }
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        match std::env::var("UPLOAD_DIR") {
            Ok(dir) if dir.trim().is_empty() => {
                Err(StorageError::config_error("UPLOAD_DIR is set but empty"))
            }
            Ok(dir) => Ok(Self {
                root: PathBuf::from(dir),
            }),
            Err(_) => Ok(Self::default()),
        }
    }
}

/// The single directory shared by every request.
///
/// Concurrent requests are isolated only by file names: uploads carry a
/// random UUID prefix, clips carry the provider task id, final videos carry
/// the generated video id.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Create a store rooted at the configured directory.
    pub fn new(config: StoreConfig) -> Self {
        Self { root: config.root }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(StoreConfig::from_env()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist yet.
    pub async fn init(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root).await?;
        info!("Uploads directory ready at {}", self.root.display());
        Ok(())
    }

    /// Persist one uploaded image and return its path.
    pub async fn save_upload(&self, original_name: Option<&str>, data: &[u8]) -> StorageResult<PathBuf> {
        if data.is_empty() {
            return Err(StorageError::upload_failed(format!(
                "empty upload: {}",
                original_name.unwrap_or("<unnamed>")
            )));
        }

        let name = sanitize_file_name(original_name.unwrap_or_default());
        let path = self.root.join(format!("{}_{}", Uuid::new_v4(), name));

        fs::write(&path, data).await?;
        debug!("Saved upload {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }

    /// Best-effort removal of files written by this store.
    pub async fn discard(&self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = fs::remove_file(path).await {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }

    /// The `count` most recently created source images, oldest first.
    ///
    /// Provider clips, finished videos and hidden files are skipped. Fewer
    /// than `count` images are returned when the directory holds fewer.
    pub async fn latest_images(&self, count: usize) -> StorageResult<Vec<UploadedImage>> {
        let mut images = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !is_source_image(name) {
                continue;
            }

            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);

            images.push(UploadedImage::new(entry.path(), DateTime::<Utc>::from(created)));
        }

        images.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.path.cmp(&b.path)));

        let skip = images.len().saturating_sub(count);
        Ok(images.split_off(skip))
    }

    /// Destination of an intermediate clip, e.g. `temp_<task>.mp4`.
    pub fn clip_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!(
            "{}{}.{}",
            CLIP_PREFIX,
            sanitize_file_name(stem),
            VIDEO_EXTENSION
        ))
    }

    /// Where the merged video for `id` lives once finished.
    pub fn final_video_path(&self, id: &VideoId) -> PathBuf {
        self.root.join(format!("{}.{}", id.as_str(), VIDEO_EXTENSION))
    }

    /// Where the merged video for `id` is written before it is published.
    pub fn partial_video_path(&self, id: &VideoId) -> PathBuf {
        self.root
            .join(format!("{}.{}{}", id.as_str(), VIDEO_EXTENSION, PARTIAL_SUFFIX))
    }

    /// Path of a finished video, or `NotFound`.
    pub async fn find_final_video(&self, id: &VideoId) -> StorageResult<PathBuf> {
        if !id.is_safe() {
            return Err(StorageError::invalid_key(id.as_str()));
        }

        let path = self.final_video_path(id);
        if fs::try_exists(&path).await? {
            Ok(path)
        } else {
            Err(StorageError::not_found(id.as_str()))
        }
    }

    /// Verify the directory accepts writes.
    pub async fn check_writable(&self) -> StorageResult<()> {
        let probe = self.root.join(format!(".ready-{}", Uuid::new_v4()));
        fs::write(&probe, b"ok").await?;
        fs::remove_file(&probe).await?;
        Ok(())
    }
}

fn is_source_image(name: &str) -> bool {
    !name.starts_with('.')
        && !name.starts_with(CLIP_PREFIX)
        && !name.ends_with(PARTIAL_SUFFIX)
        && !Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(VIDEO_EXTENSION))
}

/// Reduce a client-supplied name to a single safe path component.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}
