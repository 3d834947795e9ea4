use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::storage::task::{TaskPatch, TaskStore};

#[derive(Debug)]
struct ProgressUpdate {
    task_id: String,
    progress: f64,
}

/// Relays progress updates from job bodies (including blocking worker
/// threads) into the task store. Producers post onto an unbounded channel
/// and never wait on store I/O; a single consumer loop applies the updates.
#[derive(Clone)]
pub struct ProgressBridge {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ProgressBridge {
    pub fn start(store: Arc<dyn TaskStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressUpdate>();

        tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                let progress = round1(update.progress.clamp(0.0, 100.0));
                let patch = TaskPatch::new().progress(progress);
                if let Err(e) = store.update(&update.task_id, patch).await {
                    // Progress is best effort; a lost update only delays the
                    // percentage the client sees.
                    warn!("Dropping progress update for task {}: {}", update.task_id, e);
                }
            }
        });

        Self { tx }
    }

    pub fn reporter(&self, task_id: String) -> ProgressReporter {
        ProgressReporter {
            task_id,
            tx: self.tx.clone(),
        }
    }
}

/// Per-task progress handle. `report` is synchronous and fire-and-forget,
/// safe to call from inside a blocking extractor thread.
#[derive(Clone)]
pub struct ProgressReporter {
    task_id: String,
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ProgressReporter {
    pub fn report(&self, progress: f64) {
        let _ = self.tx.send(ProgressUpdate {
            task_id: self.task_id.clone(),
            progress,
        });
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::TaskKind;
    use crate::storage::task::InMemoryTaskStore;
    use std::time::Duration;

    #[tokio::test]
    async fn test_updates_reach_the_store() {
        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
        let bridge = ProgressBridge::start(store.clone());
        let task_id = store.create(TaskKind::Analyze).await.unwrap();

        let reporter = bridge.reporter(task_id.clone());
        reporter.report(12.34);

        // consumer runs on a spawned task
        tokio::time::sleep(Duration::from_millis(50)).await;
        let record = store.get(&task_id).await.unwrap().unwrap();
        assert_eq!(record.progress, 12.3);
    }

    #[tokio::test]
    async fn test_out_of_range_values_are_clamped() {
        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
        let bridge = ProgressBridge::start(store.clone());
        let task_id = store.create(TaskKind::Analyze).await.unwrap();

        let reporter = bridge.reporter(task_id.clone());
        reporter.report(250.0);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.get(&task_id).await.unwrap().unwrap().progress, 100.0);

        reporter.report(-5.0);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.get(&task_id).await.unwrap().unwrap().progress, 0.0);
    }

    #[tokio::test]
    async fn test_report_from_blocking_thread() {
        let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
        let bridge = ProgressBridge::start(store.clone());
        let task_id = store.create(TaskKind::Analyze).await.unwrap();

        let reporter = bridge.reporter(task_id.clone());
        tokio::task::spawn_blocking(move || {
            reporter.report(55.0);
        })
        .await
        .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.get(&task_id).await.unwrap().unwrap().progress, 55.0);
    }
}
