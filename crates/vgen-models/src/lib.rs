//! Shared data models for the VGen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Provider identifiers and per-provider credentials
//! - Generation request/response bodies exchanged with clients
//! - Provider-side generation tasks and their status vocabulary
//! - Final video identifiers and uploaded image records

pub mod api;
pub mod credentials;
pub mod provider;
pub mod task;
pub mod upload;
pub mod video;

// Re-export common types
pub use api::{
    GenerateVideoRequest, GenerateVideoResponse, ProviderInfo, ProvidersResponse,
    UploadImagesResponse, MAX_PROMPTS, MIN_PROMPTS,
};
pub use credentials::{CredentialError, Credentials};
pub use provider::{ProviderId, UnknownProvider};
pub use task::{GenerationTask, TaskStatus};
pub use upload::UploadedImage;
pub use video::{VideoId, VideoStatus};
