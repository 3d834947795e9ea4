use async_trait::async_trait;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::jobs::types::{TaskKind, TaskRecord, TaskResult, TaskStatus};

pub mod memory;
pub mod redis;

pub use memory::InMemoryTaskStore;
pub use redis::{RedisProbe, RedisTaskStore};

/// Pluggable task persistence. All operations must be safe under arbitrary
/// concurrent callers; `update` on an unknown id is a no-op.
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    async fn create(&self, kind: TaskKind) -> Result<String>;
    async fn get(&self, task_id: &str) -> Result<Option<TaskRecord>>;
    async fn update(&self, task_id: &str, patch: TaskPatch) -> Result<()>;
}

/// Partial update merged into an existing record.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub progress: Option<f64>,
    pub result: Option<TaskResult>,
    pub error: Option<String>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn result(mut self, result: TaskResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn apply(&self, record: &mut TaskRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(progress) = self.progress {
            record.progress = progress;
        }
        if let Some(result) = &self.result {
            record.result = Some(result.clone());
        }
        if let Some(error) = &self.error {
            record.error = Some(error.clone());
        }
        record.updated_at = Utc::now();
    }
}

pub(crate) fn new_task_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}

/// Pick the task store backend once at startup. A configured Redis URL is
/// probed with a PING; any failure degrades to the in-memory store for the
/// process lifetime.
pub async fn select_store(settings: &Settings) -> Arc<dyn TaskStore> {
    if settings.redis_url.is_empty() {
        info!("REDIS_URL not configured, using in-memory task store");
        return Arc::new(InMemoryTaskStore::new());
    }

    let ttl = Duration::from_secs(settings.task_ttl_secs);
    match RedisTaskStore::connect(&settings.redis_url, ttl).await {
        RedisProbe::Available(store) => {
            info!("Using Redis task store at {}", settings.redis_url);
            Arc::new(store)
        }
        RedisProbe::Unavailable(reason) => {
            warn!(
                "Redis task store unavailable ({}), falling back to in-memory store",
                reason
            );
            Arc::new(InMemoryTaskStore::new())
        }
    }
}
