//! Per-request execution context handed to endpoints.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::Semaphore;

use crate::error::EndpointError;

/// Runs blocking or CPU-heavy work off the async workers.
///
/// Concurrency is bounded by a semaphore so a burst of slow work cannot
/// exhaust tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct OffloadExecutor {
    permits: Arc<Semaphore>,
}

impl OffloadExecutor {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Run `task` on the blocking pool and await its result.
    ///
    /// A panic inside `task` surfaces as an unexpected failure.
    pub async fn run<F, R>(&self, task: F) -> Result<R, EndpointError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| anyhow!("offload executor is closed"))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            task()
        })
        .await
        .map_err(|e| EndpointError::Unexpected(anyhow!("offloaded task failed: {}", e)))
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Context for a single request.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    request_id: String,
    offload: OffloadExecutor,
}

impl ExecutionContext {
    pub fn new(request_id: impl Into<String>, offload: OffloadExecutor) -> Self {
        Self {
            request_id: request_id.into(),
            offload,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn offload(&self) -> &OffloadExecutor {
        &self.offload
    }
}
