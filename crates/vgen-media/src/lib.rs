//! FFmpeg CLI wrapper for merging generated clips.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - FFprobe duration and audio-stream lookups
//! - In-order concatenation of provider clips, re-encoded to one H.264 MP4

pub mod command;
pub mod concat;
pub mod error;
pub mod probe;
pub mod progress;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{merge_clips, merge_clips_with, MergeSummary};
pub use error::{MediaError, MediaResult};
pub use probe::{get_duration, probe_clip, ClipInfo};
pub use progress::FfmpegProgress;
