use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{IdleScheduler, IdleTask, TaskHandle};

struct QueuedTask {
    handle: TaskHandle,
    deadline: Instant,
    task: IdleTask,
}

/// Scheduler driven by the host's own idle loop.
///
/// Tasks are queued in schedule order. The host calls [`run_idle`](Self::run_idle)
/// whenever it has nothing better to do, and [`run_overdue`](Self::run_overdue)
/// to honor deadlines while busy. Tasks always run outside the queue lock, so a
/// task may schedule further work.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<Vec<QueuedTask>>,
    next_id: AtomicU64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every queued task. Returns the number of tasks run.
    pub fn run_idle(&self) -> usize {
        let tasks: Vec<QueuedTask> = std::mem::take(&mut *self.queue.lock());
        let count = tasks.len();
        for queued in tasks {
            (queued.task)();
        }
        count
    }

    /// Run only the tasks whose deadline is at or before `now`.
    pub fn run_overdue(&self, now: Instant) -> usize {
        let due: Vec<QueuedTask> = {
            let mut queue = self.queue.lock();
            let (due, waiting): (Vec<QueuedTask>, Vec<QueuedTask>) = std::mem::take(&mut *queue)
                .into_iter()
                .partition(|q| q.deadline <= now);
            *queue = waiting;
            due
        };
        let count = due.len();
        for queued in due {
            (queued.task)();
        }
        count
    }

    /// Number of tasks waiting to run
    pub fn pending_count(&self) -> usize {
        self.queue.lock().len()
    }
}

impl IdleScheduler for ManualScheduler {
    fn schedule(&self, task: IdleTask, max_delay: Duration) -> Option<TaskHandle> {
        let handle = TaskHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.queue.lock().push(QueuedTask {
            handle,
            deadline: Instant::now() + max_delay,
            task,
        });
        Some(handle)
    }

    fn cancel(&self, handle: TaskHandle) {
        self.queue.lock().retain(|q| q.handle != handle);
    }
}
