//! Sequenced task execution contexts.
//!
//! The resolution stack runs on two cooperating contexts: an I/O context where
//! all resolver calls and completion callbacks happen, and a control context
//! where application-supplied hooks run. [`TaskRunner`] is the only way to
//! cross between them, mirroring Chromium's sequenced task runner pattern:
//! closures posted to one runner execute in post order, one at a time, on a
//! dedicated drain task.
//!
//! # Example
//!
//! ```rust,ignore
//! use detournet::runner::TaskRunner;
//!
//! let io = TaskRunner::new("io");
//! io.post(|| println!("runs on the I/O context"));
//! ```

use std::time::Duration;
use tokio::sync::mpsc;

type Task = Box<dyn FnOnce() + Send>;

/// A sequenced task queue bound to the tokio runtime.
///
/// Cloning a `TaskRunner` yields another handle to the same queue. The drain
/// task exits once every handle has been dropped and the queue is empty.
///
/// Must be created from within a tokio runtime.
#[derive(Clone)]
pub struct TaskRunner {
    name: &'static str,
    tx: mpsc::UnboundedSender<Task>,
}

impl TaskRunner {
    /// Creates a new runner and spawns its drain task.
    ///
    /// The name is only used in logging.
    pub fn new(name: &'static str) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                task();
            }
        });
        Self { name, tx }
    }

    /// Posts a task to run on this context.
    ///
    /// Returns `false` if the runner has stopped (runtime shut down); the
    /// task is dropped in that case.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        let accepted = self.tx.send(Box::new(task)).is_ok();
        if !accepted {
            tracing::warn!(runner = self.name, "task dropped; runner stopped");
        }
        accepted
    }

    /// Posts a task to run on this context after `delay`.
    ///
    /// Ordering relative to other delayed tasks follows their deadlines, not
    /// their post order.
    pub fn post_delayed(&self, delay: Duration, task: impl FnOnce() + Send + 'static) {
        let tx = self.tx.clone();
        let name = self.name;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(Box::new(task)).is_err() {
                tracing::warn!(runner = name, "delayed task dropped; runner stopped");
            }
        });
    }

    /// The name this runner was created with.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner").field("name", &self.name).finish()
    }
}
