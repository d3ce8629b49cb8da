//! Uploaded source images.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An image saved in the uploads directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadedImage {
    pub path: PathBuf,
    /// Filesystem creation time (modification time where unsupported)
    pub created_at: DateTime<Utc>,
}

impl UploadedImage {
    pub fn new(path: impl Into<PathBuf>, created_at: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            created_at,
        }
    }
}
