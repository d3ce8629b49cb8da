//! Provider-side generation tasks.
//!
//! Each provider reports progress with its own vocabulary; clients map those
//! strings onto [`TaskStatus`] before handing a task to the polling loop.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalised lifecycle of a provider task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted by the provider, not started
    #[default]
    Submitted,
    /// Provider is rendering
    Processing,
    /// Clip is ready for download
    Succeeded,
    /// Provider gave up
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Submitted => "submitted",
            TaskStatus::Processing => "processing",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more polling needed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of one provider task as last read by polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationTask {
    /// Opaque provider-assigned id
    pub task_id: String,
    pub status: TaskStatus,
    /// Download location of the finished clip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    /// Provider-supplied failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl GenerationTask {
    /// A freshly submitted task.
    pub fn submitted(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Submitted,
            result_url: None,
            error_message: None,
        }
    }

    /// Same task with a new non-terminal status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark as succeeded with the clip's URL.
    pub fn succeed(mut self, url: impl Into<String>) -> Self {
        self.status = TaskStatus::Succeeded;
        self.result_url = Some(url.into());
        self
    }

    /// Mark as failed with the provider's message.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.status = TaskStatus::Failed;
        self.error_message = Some(message.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_lifecycle() {
        let task = GenerationTask::submitted("t-1");
        assert_eq!(task.status, TaskStatus::Submitted);
        assert!(!task.is_terminal());

        let task = task.with_status(TaskStatus::Processing);
        assert!(!task.is_terminal());

        let done = task.clone().succeed("https://cdn/clip.mp4");
        assert!(done.is_terminal());
        assert_eq!(done.result_url.as_deref(), Some("https://cdn/clip.mp4"));

        let failed = task.fail("nsfw");
        assert!(failed.is_terminal());
        assert_eq!(failed.error_message.as_deref(), Some("nsfw"));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&TaskStatus::Succeeded).unwrap(), "\"succeeded\"");
        assert_eq!(TaskStatus::Processing.to_string(), "processing");
    }
}
