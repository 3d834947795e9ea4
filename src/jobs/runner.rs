use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::jobs::progress::{ProgressBridge, ProgressReporter};
use crate::jobs::types::{TaskResult, TaskStatus};
use crate::storage::task::{TaskPatch, TaskStore};

const TERMINAL_WRITE_ATTEMPTS: u32 = 2;
const TERMINAL_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Drive a task through its lifecycle: mark it processing, run the
/// job-specific procedure, then write exactly one terminal state. Errors are
/// converted into a `failed` record and never escape the spawned task.
pub async fn run_job<F, Fut>(
    store: Arc<dyn TaskStore>,
    bridge: ProgressBridge,
    task_id: String,
    job: F,
) where
    F: FnOnce(ProgressReporter) -> Fut,
    Fut: Future<Output = anyhow::Result<TaskResult>>,
{
    if let Err(e) = store
        .update(&task_id, TaskPatch::new().status(TaskStatus::Processing))
        .await
    {
        // The job still runs; the client just keeps seeing "pending" a while.
        error!("Failed to mark task {} processing: {}", task_id, e);
    }

    let reporter = bridge.reporter(task_id.clone());

    let patch = match job(reporter).await {
        Ok(result) => {
            info!("Task {} completed", task_id);
            TaskPatch::new()
                .status(TaskStatus::Completed)
                .progress(100.0)
                .result(result)
        }
        Err(e) => {
            error!("Task {} failed: {:#}", task_id, e);
            TaskPatch::new()
                .status(TaskStatus::Failed)
                .error(e.to_string())
        }
    };

    write_terminal(&store, &task_id, patch).await;
}

async fn write_terminal(store: &Arc<dyn TaskStore>, task_id: &str, patch: TaskPatch) {
    for attempt in 1..=TERMINAL_WRITE_ATTEMPTS {
        match store.update(task_id, patch.clone()).await {
            Ok(()) => return,
            Err(e) if attempt < TERMINAL_WRITE_ATTEMPTS => {
                error!(
                    "Terminal write for task {} failed (attempt {}): {}",
                    task_id, attempt, e
                );
                tokio::time::sleep(TERMINAL_RETRY_DELAY).await;
            }
            Err(e) => {
                // The task is stuck in "processing" from the client's view.
                error!("Giving up on terminal write for task {}: {}", task_id, e);
            }
        }
    }
}
