//! Idle-time task scheduling.
//!
//! The hostname database never reclaims memory on the producer's path. It
//! hands a one-shot task to an [`IdleScheduler`] instead, along with a soft
//! deadline, and the scheduler decides when the task actually runs.
//!
//! ## Implementations
//!
//! | Scheduler | Runs tasks |
//! |-----------|------------|
//! | [`NilScheduler`] | never (tasks are refused and dropped) |
//! | [`ManualScheduler`] | when the host calls `run_idle` / `run_overdue` |
//! | `TokioScheduler` | on a tokio runtime once the deadline passes (feature `async`) |

mod manual;
#[cfg(feature = "async")]
mod runtime;

use std::time::Duration;

pub use manual::ManualScheduler;
#[cfg(feature = "async")]
pub use runtime::TokioScheduler;

/// One-shot deferred task.
pub type IdleTask = Box<dyn FnOnce() + Send + 'static>;

/// Opaque handle identifying a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Trait for deferring work until the host is idle
pub trait IdleScheduler: Send + Sync {
    /// Schedule `task` to run once, no later than roughly `max_delay` from now.
    ///
    /// The deadline is advisory. Implementations may run the task earlier
    /// (when idle) or later (when busy). Returns `None` when the task was
    /// refused and will never run.
    fn schedule(&self, task: IdleTask, max_delay: Duration) -> Option<TaskHandle>;

    /// Cancel a scheduled task. Unknown or already-run handles are ignored.
    fn cancel(&self, handle: TaskHandle);
}

/// Nil scheduler - refuses every task without running it
#[derive(Debug, Clone, Copy, Default)]
pub struct NilScheduler;

impl IdleScheduler for NilScheduler {
    fn schedule(&self, _task: IdleTask, _max_delay: Duration) -> Option<TaskHandle> {
        None
    }

    fn cancel(&self, _handle: TaskHandle) {}
}
