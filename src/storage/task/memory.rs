use async_trait::async_trait;
use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{new_task_id, TaskPatch, TaskStore};
use crate::jobs::types::{TaskKind, TaskRecord};

/// Volatile task store: a single lock over an in-process map.
/// Records live for the process lifetime; there is no eviction.
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<String, TaskRecord>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, kind: TaskKind) -> Result<String> {
        let task_id = new_task_id();
        let record = TaskRecord::new(task_id.clone(), kind);
        self.tasks.lock().await.insert(task_id.clone(), record);
        Ok(task_id)
    }

    async fn get(&self, task_id: &str) -> Result<Option<TaskRecord>> {
        Ok(self.tasks.lock().await.get(task_id).cloned())
    }

    async fn update(&self, task_id: &str, patch: TaskPatch) -> Result<()> {
        if let Some(record) = self.tasks.lock().await.get_mut(task_id) {
            patch.apply(record);
        }
        Ok(())
    }
}
