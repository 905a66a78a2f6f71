//! Runtime engine: the periodic tasks that drive the game.
//!
//! Every background loop is owned by a `TaskGuard`; dropping the guard
//! aborts the task, so no timer or poller outlives whatever started it.

pub mod clock;

use std::future::Future;
use tokio::task::JoinHandle;
use tracing::debug;

/// Owns a spawned task and aborts it on drop.
#[derive(Debug)]
pub struct TaskGuard {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl TaskGuard {
    pub fn spawn<F>(name: &'static str, future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(task = name, "Task started");
        Self {
            name,
            handle: tokio::spawn(future),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(task = self.name, "Task stopped");
    }
}
