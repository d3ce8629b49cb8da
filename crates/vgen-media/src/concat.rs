//! Concatenation of provider clips into the final video.
//!
//! Clips are joined with the concat demuxer and re-encoded to H.264 so that
//! clips from different providers (or with slightly different parameters)
//! still produce one playable file. Audio is kept as AAC only when every
//! clip carries an audio track. The result is written next
//! to the destination under a `.part` name and renamed into place, so a
//! reader never observes a half-written video.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{get_duration, probe_clip, ClipInfo};

/// Suffix of the output while ffmpeg is still writing it.
const PARTIAL_SUFFIX: &str = ".part";

/// Outcome of a successful merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    /// Published output file
    pub output: PathBuf,
    /// Number of clips joined
    pub clip_count: usize,
    /// Output duration in seconds, when ffprobe could read it
    pub duration_secs: Option<f64>,
    /// Wall-clock time spent in ffmpeg
    pub elapsed_ms: u64,
}

/// Merge `clips` in order into `output` with a default runner.
///
/// See [`merge_clips_with`].
pub async fn merge_clips(clips: &[PathBuf], output: &Path) -> MediaResult<MergeSummary> {
    merge_clips_with(&FfmpegRunner::new(), clips, output).await
}

/// Merge `clips` in order into `output`.
///
/// Input clips are deleted only after the output has been published;
/// failing to delete one is logged and does not fail the merge. On error
/// the inputs are left untouched and no output file exists.
pub async fn merge_clips_with(
    runner: &FfmpegRunner,
    clips: &[PathBuf],
    output: &Path,
) -> MediaResult<MergeSummary> {
    if clips.is_empty() {
        return Err(MediaError::NoClips);
    }

    let mut inputs = Vec::with_capacity(clips.len());
    for clip in clips {
        if !fs::try_exists(clip).await? {
            return Err(MediaError::FileNotFound(clip.clone()));
        }
        inputs.push(fs::canonicalize(clip).await?);
    }

    let probes = probe_inputs(&inputs).await;
    let total_ms = expected_duration_ms(&probes);

    let out_dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let partial = partial_path(output);

    // The list lives beside the output and is removed when dropped.
    let mut list = tempfile::Builder::new()
        .prefix(".concat-")
        .suffix(".txt")
        .tempfile_in(&out_dir)?;
    list.write_all(concat_list(&inputs).as_bytes())?;
    list.flush()?;

    let with_audio = keep_audio(&probes);
    let cmd = FfmpegCommand::concat_list(list.path(), &partial).video_codec("libx264");
    let cmd = if with_audio {
        cmd.audio_codec("aac")
    } else {
        cmd.no_audio()
    };
    let cmd = cmd.faststart().format("mp4");

    info!(
        clips = inputs.len(),
        with_audio,
        output = %output.display(),
        "Merging clips"
    );

    let started = Instant::now();
    let run = runner
        .run_with_progress(&cmd, move |p| {
            debug!(
                percent = %format!("{:.1}", p.percentage(total_ms)),
                eta_secs = ?p.eta_seconds(total_ms),
                "Merge progress"
            );
        })
        .await;

    if let Err(e) = run {
        if let Err(rm) = fs::remove_file(&partial).await {
            if rm.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove partial output {}: {}", partial.display(), rm);
            }
        }
        return Err(e);
    }

    fs::rename(&partial, output).await?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    remove_inputs(&inputs).await;

    let duration_secs = get_duration(output).await.ok();
    info!(
        output = %output.display(),
        duration_secs = ?duration_secs,
        elapsed_ms,
        "Merged {} clips",
        inputs.len()
    );

    Ok(MergeSummary {
        output: output.to_path_buf(),
        clip_count: inputs.len(),
        duration_secs,
        elapsed_ms,
    })
}

/// Probe every input; `None` marks a clip ffprobe could not read.
async fn probe_inputs(inputs: &[PathBuf]) -> Vec<Option<ClipInfo>> {
    let mut probes = Vec::with_capacity(inputs.len());
    for input in inputs {
        match probe_clip(input).await {
            Ok(info) => probes.push(Some(info)),
            Err(e) => {
                debug!("Could not probe {}: {}", input.display(), e);
                probes.push(None);
            }
        }
    }
    probes
}

/// Sum of the input durations, zero when any of them could not be probed.
fn expected_duration_ms(probes: &[Option<ClipInfo>]) -> i64 {
    probes
        .iter()
        .map(|p| p.map(|info| info.duration))
        .sum::<Option<f64>>()
        .map_or(0, |secs| (secs * 1000.0) as i64)
}

/// The concat demuxer takes its stream layout from the first clip, so one
/// silent clip means the output drops audio. Unreadable clips leave the
/// decision to ffmpeg.
fn keep_audio(probes: &[Option<ClipInfo>]) -> bool {
    probes.iter().flatten().all(|info| info.has_audio)
}

async fn remove_inputs(inputs: &[PathBuf]) {
    for input in inputs {
        if let Err(e) = fs::remove_file(input).await {
            warn!("Failed to remove merged clip {}: {}", input.display(), e);
        }
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Render a concat demuxer list, one `file '<path>'` line per clip.
fn concat_list(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', r"'\''")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{check_ffmpeg, check_ffprobe};
    use tempfile::TempDir;

    fn ffmpeg_available() -> bool {
        let ok = check_ffmpeg().is_ok() && check_ffprobe().is_ok();
        if !ok {
            eprintln!("skipping: ffmpeg/ffprobe not installed");
        }
        ok
    }

    async fn make_clip(path: &Path, secs: u32) {
        let source = format!("testsrc=duration={secs}:size=160x120:rate=25");
        let cmd = FfmpegCommand::new(source, path)
            .input_args(["-f", "lavfi"])
            .video_codec("libx264");
        FfmpegRunner::new().with_timeout(60).run(&cmd).await.unwrap();
    }

    #[test]
    fn test_concat_list_escapes_quotes() {
        let list = concat_list(&[
            PathBuf::from("/up/temp_a.mp4"),
            PathBuf::from("/up/it's.mp4"),
        ]);
        assert_eq!(list, "file '/up/temp_a.mp4'\nfile '/up/it'\\''s.mp4'\n");
    }

    fn clip(duration: f64, has_audio: bool) -> Option<ClipInfo> {
        Some(ClipInfo {
            duration,
            has_audio,
        })
    }

    #[test]
    fn test_expected_duration() {
        assert_eq!(expected_duration_ms(&[clip(1.5, true), clip(2.0, false)]), 3500);
        assert_eq!(expected_duration_ms(&[clip(1.5, true), None]), 0);
    }

    #[test]
    fn test_keep_audio_only_when_every_clip_has_it() {
        assert!(keep_audio(&[clip(1.0, true), clip(1.0, true)]));
        assert!(!keep_audio(&[clip(1.0, true), clip(1.0, false)]));
        assert!(!keep_audio(&[clip(1.0, false)]));
        assert!(keep_audio(&[clip(1.0, true), None]));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/up/v-1.mp4")),
            PathBuf::from("/up/v-1.mp4.part")
        );
    }

    #[tokio::test]
    async fn test_merge_rejects_empty_input() {
        let dir = TempDir::new().unwrap();
        let err = merge_clips(&[], &dir.path().join("out.mp4")).await.unwrap_err();
        assert!(matches!(err, MediaError::NoClips));
    }

    #[tokio::test]
    async fn test_merge_rejects_missing_clip() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("temp_a.mp4");
        std::fs::write(&present, b"x").unwrap();
        let missing = dir.path().join("temp_b.mp4");

        let err = merge_clips(&[present.clone(), missing.clone()], &dir.path().join("out.mp4"))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::FileNotFound(p) if p == missing));
        assert!(present.exists());
    }

    #[tokio::test]
    async fn test_merge_three_clips() {
        if !ffmpeg_available() {
            return;
        }

        let dir = TempDir::new().unwrap();
        let mut clips = Vec::new();
        for i in 0..3 {
            let clip = dir.path().join(format!("temp_{i}.mp4"));
            make_clip(&clip, 1).await;
            clips.push(clip);
        }

        let output = dir.path().join("final.mp4");
        let summary = merge_clips(&clips, &output).await.unwrap();

        assert_eq!(summary.clip_count, 3);
        assert_eq!(summary.output, output);
        assert!(output.exists());
        assert!(!partial_path(&output).exists());

        let info = probe_clip(&output).await.unwrap();
        assert!((info.duration - 3.0).abs() < 0.5, "duration was {}", info.duration);
        assert!(!info.has_audio);

        for clip in &clips {
            assert!(!clip.exists(), "{} should be deleted", clip.display());
        }
    }

    #[tokio::test]
    async fn test_failed_merge_keeps_inputs() {
        if !ffmpeg_available() {
            return;
        }

        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("temp_bogus.mp4");
        std::fs::write(&bogus, b"definitely not a video").unwrap();
        let output = dir.path().join("final.mp4");

        let err = merge_clips(&[bogus.clone()], &output).await.unwrap_err();

        assert!(matches!(err, MediaError::FfmpegFailed { .. }));
        assert!(bogus.exists());
        assert!(!output.exists());
        assert!(!partial_path(&output).exists());
    }
}
