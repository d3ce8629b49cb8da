//! Local uploads directory.
//!
//! This crate provides:
//! - Saving uploaded source images under collision-free names
//! - Selecting the most recent uploads for a generation request
//! - Naming intermediate provider clips and final merged videos
//! - Looking up finished videos by id

pub mod error;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use store::{sanitize_file_name, StoreConfig, UploadStore, CLIP_PREFIX, VIDEO_EXTENSION};
