use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::{IdleScheduler, IdleTask, TaskHandle};
use crate::error::{HostDbError, Result};

/// Scheduler backed by a tokio runtime.
///
/// Tokio has no notion of idleness, so each task simply runs once its
/// deadline elapses. Outstanding tasks are aborted when the scheduler drops.
pub struct TokioScheduler {
    handle: Handle,
    tasks: Arc<Mutex<HashMap<u64, JoinHandle<()>>>>,
    next_id: AtomicU64,
}

impl TokioScheduler {
    /// Create a scheduler spawning onto the given runtime
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a scheduler for the runtime the caller is running on
    pub fn try_current() -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| HostDbError::SchedulerError(format!("no tokio runtime: {}", e)))?;
        Ok(Self::new(handle))
    }

    /// Number of spawned tasks that have neither run nor been cancelled
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().len()
    }
}

impl IdleScheduler for TokioScheduler {
    fn schedule(&self, task: IdleTask, max_delay: Duration) -> Option<TaskHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tasks = Arc::clone(&self.tasks);

        // Hold the map lock across spawn so the task cannot finish and
        // deregister before it has been registered.
        let mut registry = self.tasks.lock();
        let join = self.handle.spawn(async move {
            tokio::time::sleep(max_delay).await;
            tasks.lock().remove(&id);
            tracing::trace!(task_id = id, "running idle task");
            task();
        });
        registry.insert(id, join);
        tracing::debug!(task_id = id, delay_ms = max_delay.as_millis() as u64, "idle task scheduled");

        Some(TaskHandle::new(id))
    }

    fn cancel(&self, handle: TaskHandle) {
        if let Some(join) = self.tasks.lock().remove(&handle.id()) {
            join.abort();
            tracing::debug!(task_id = handle.id(), "idle task cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, join) in self.tasks.lock().drain() {
            join.abort();
        }
    }
}
