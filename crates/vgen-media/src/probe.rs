//! Clip probing with ffprobe.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// What the merge needs to know about one clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipInfo {
    /// Container duration in seconds, zero when not reported
    pub duration: f64,
    /// Whether any audio stream is present
    pub has_audio: bool,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
}

impl ProbeOutput {
    fn into_clip_info(self) -> MediaResult<ClipInfo> {
        let has_stream = |kind: &str| {
            self.streams
                .iter()
                .any(|s| s.codec_type.as_deref() == Some(kind))
        };

        if !has_stream("video") {
            return Err(MediaError::InvalidVideo("no video stream".to_string()));
        }

        Ok(ClipInfo {
            duration: self
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(|d| d.parse().ok())
                .unwrap_or(0.0),
            has_audio: has_stream("audio"),
        })
    }
}

/// Probe a clip's duration and stream layout.
pub async fn probe_clip(path: impl AsRef<Path>) -> MediaResult<ClipInfo> {
    let path = path.as_ref();

    if !tokio::fs::try_exists(path).await? {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_entries",
            "format=duration:stream=codec_type",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("ffprobe failed on {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        });
    }

    serde_json::from_slice::<ProbeOutput>(&output.stdout)?.into_clip_info()
}

/// Duration in seconds.
pub async fn get_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    Ok(probe_clip(path).await?.duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> MediaResult<ClipInfo> {
        serde_json::from_str::<ProbeOutput>(json)
            .unwrap()
            .into_clip_info()
    }

    #[test]
    fn test_video_only_clip() {
        let info = parse(
            r#"{"streams":[{"codec_type":"video"}],"format":{"duration":"5.041000"}}"#,
        )
        .unwrap();
        assert!((info.duration - 5.041).abs() < 1e-9);
        assert!(!info.has_audio);
    }

    #[test]
    fn test_clip_with_audio_and_no_duration() {
        let info = parse(
            r#"{"streams":[{"codec_type":"audio"},{"codec_type":"video"}],"format":{}}"#,
        )
        .unwrap();
        assert_eq!(info.duration, 0.0);
        assert!(info.has_audio);
    }

    #[test]
    fn test_audio_only_file_is_rejected() {
        let err = parse(r#"{"streams":[{"codec_type":"audio"}]}"#).unwrap_err();
        assert!(matches!(err, MediaError::InvalidVideo(_)));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_clip("/nonexistent/clip.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
