//! Bounded fixed-interval polling of provider tasks.

use std::future::Future;
use std::time::Duration;

use tracing::debug;
use vgen_models::GenerationTask;

use crate::error::{ProviderError, ProviderResult};

/// How often and how many times a task status is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two consecutive checks
    pub interval: Duration,
    /// Upper bound on status checks
    pub max_polls: u32,
}

impl PollPolicy {
    pub const fn new(interval: Duration, max_polls: u32) -> Self {
        Self { interval, max_polls }
    }

    /// Longest time a task is waited for.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_polls.saturating_sub(1)
    }
}

/// Call `check` until it reports a terminal task or the bound is reached.
///
/// At most `policy.max_polls` checks are made, with `policy.interval` of
/// sleep between two checks and none after the last one. The first terminal
/// snapshot is returned as is; the caller decides what success or failure
/// means. Errors from `check` abort polling immediately.
pub async fn poll_until_terminal<F, Fut>(
    policy: PollPolicy,
    mut check: F,
) -> ProviderResult<GenerationTask>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<GenerationTask>>,
{
    for attempt in 1..=policy.max_polls {
        let task = check().await?;
        if task.is_terminal() {
            return Ok(task);
        }

        debug!(
            task_id = %task.task_id,
            status = %task.status,
            attempt,
            max_polls = policy.max_polls,
            "Task not finished yet"
        );

        if attempt < policy.max_polls {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(ProviderError::Timeout {
        polls: policy.max_polls,
        interval: policy.interval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;
    use vgen_models::TaskStatus;

    const FAST: Duration = Duration::from_millis(1);

    /// Replays `script` one status per check, repeating the last entry.
    fn scripted(script: &[TaskStatus], calls: &AtomicU32) -> GenerationTask {
        let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
        let status = script[n.min(script.len() - 1)];
        let task = GenerationTask::submitted("task-1");
        match status {
            TaskStatus::Succeeded => task.succeed("https://cdn/clip.mp4"),
            TaskStatus::Failed => task.fail("content policy"),
            other => task.with_status(other),
        }
    }

    #[tokio::test]
    async fn test_returns_first_terminal_status() {
        let calls = AtomicU32::new(0);
        let script = [
            TaskStatus::Submitted,
            TaskStatus::Processing,
            TaskStatus::Succeeded,
            TaskStatus::Failed,
        ];

        let task = poll_until_terminal(PollPolicy::new(FAST, 10), || {
            let task = scripted(&script, &calls);
            async move { Ok(task) }
        })
        .await
        .unwrap();

        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.result_url.as_deref(), Some("https://cdn/clip.mp4"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_status_is_returned_not_raised() {
        let calls = AtomicU32::new(0);
        let script = [TaskStatus::Processing, TaskStatus::Failed];

        let task = poll_until_terminal(PollPolicy::new(FAST, 5), || {
            let task = scripted(&script, &calls);
            async move { Ok(task) }
        })
        .await
        .unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_message.as_deref(), Some("content policy"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_after_exact_number_of_checks() {
        let calls = AtomicU32::new(0);
        let script = [TaskStatus::Processing];

        let err = poll_until_terminal(PollPolicy::new(FAST, 7), || {
            let task = scripted(&script, &calls);
            async move { Ok(task) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::Timeout { polls: 7, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_no_sleep_after_last_check() {
        let interval = Duration::from_millis(50);
        let started = Instant::now();

        let err = poll_until_terminal(PollPolicy::new(interval, 1), || async {
            Ok(GenerationTask::submitted("slow"))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::Timeout { polls: 1, .. }));
        assert!(started.elapsed() < interval);
    }

    #[tokio::test]
    async fn test_check_error_stops_polling() {
        let calls = Mutex::new(0u32);

        let err = poll_until_terminal(PollPolicy::new(FAST, 5), || {
            *calls.lock().unwrap() += 1;
            async { Err(ProviderError::api(500, "boom")) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::Api { status: 500, .. }));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_budget() {
        let policy = PollPolicy::new(Duration::from_secs(5), 60);
        assert_eq!(policy.budget(), Duration::from_secs(295));
        assert_eq!(PollPolicy::new(Duration::from_secs(5), 0).budget(), Duration::ZERO);
    }
}
