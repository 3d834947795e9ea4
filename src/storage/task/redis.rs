use async_trait::async_trait;
use anyhow::Result;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::warn;

use super::{new_task_id, TaskPatch, TaskStore};
use crate::jobs::types::{TaskKind, TaskRecord};

/// Durable task store backed by Redis. Records are stored as JSON under
/// `task:{id}` with a TTL that is refreshed on every write, so active tasks
/// never expire mid-flight while abandoned ones are reclaimed.
pub struct RedisTaskStore {
    conn: ConnectionManager,
    ttl: Duration,
}

/// Outcome of the startup probe. Construction and liveness are checked
/// explicitly instead of being inferred from a caught error downstream.
pub enum RedisProbe {
    Available(RedisTaskStore),
    Unavailable(String),
}

impl RedisTaskStore {
    pub async fn connect(url: &str, ttl: Duration) -> RedisProbe {
        let client = match redis::Client::open(url) {
            Ok(client) => client,
            Err(e) => return RedisProbe::Unavailable(format!("invalid redis url: {}", e)),
        };

        let mut conn = match ConnectionManager::new(client).await {
            Ok(conn) => conn,
            Err(e) => return RedisProbe::Unavailable(format!("connection failed: {}", e)),
        };

        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        match pong {
            Ok(_) => RedisProbe::Available(Self { conn, ttl }),
            Err(e) => RedisProbe::Unavailable(format!("ping failed: {}", e)),
        }
    }

    fn key(task_id: &str) -> String {
        format!("task:{}", task_id)
    }

    async fn write(&self, record: &TaskRecord) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::key(&record.task_id), payload, self.ttl.as_secs())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    async fn create(&self, kind: TaskKind) -> Result<String> {
        let task_id = new_task_id();
        let record = TaskRecord::new(task_id.clone(), kind);
        self.write(&record).await?;
        Ok(task_id)
    }

    async fn get(&self, task_id: &str) -> Result<Option<TaskRecord>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(Self::key(task_id)).await?;

        match payload {
            None => Ok(None),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(record) => Ok(Some(record)),
                Err(e) => {
                    // An undecodable record is indistinguishable from an expired one.
                    warn!("Discarding undecodable record for task {}: {}", task_id, e);
                    Ok(None)
                }
            },
        }
    }

    // Read-modify-write without optimistic locking. Only the runner owning a
    // task writes to it after creation, so concurrent writers are not expected.
    async fn update(&self, task_id: &str, patch: TaskPatch) -> Result<()> {
        let Some(mut record) = self.get(task_id).await? else {
            return Ok(());
        };
        patch.apply(&mut record);
        self.write(&record).await
    }
}
