use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting admission gate bounding simultaneous blocking extractor calls.
/// Guards only the extract invocation itself; token fetches and pre/post
/// processing run outside the permit.
pub struct ExtractLimiter {
    semaphore: Arc<Semaphore>,
}

impl ExtractLimiter {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Waits until a slot is free. The permit releases its slot on drop.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| anyhow::anyhow!("extract limiter closed: {}", e))
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
