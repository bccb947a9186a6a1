//! Cancellable scheduled tasks.
//!
//! One-shot timers (transition and celebration windows) and the periodic
//! clock refresh are tokio tasks that post a message back to the event loop.
//! Every task is tracked so teardown can abort all of them.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::{AbortHandle, JoinHandle},
    time::MissedTickBehavior,
};

/// Handle to a single scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    abort: AbortHandle,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.abort.abort();
    }
}

/// Spawns timers that deliver messages on an unbounded channel.
///
/// Must be used from within a tokio runtime. Dropping the scheduler
/// cancels every task it still tracks.
#[derive(Debug)]
pub struct TaskScheduler<M> {
    tx: mpsc::UnboundedSender<M>,
    tasks: Vec<JoinHandle<()>>,
}

impl<M: Send + 'static> TaskScheduler<M> {
    pub fn new(tx: mpsc::UnboundedSender<M>) -> Self {
        Self {
            tx,
            tasks: Vec::new(),
        }
    }

    /// Deliver `message` once after `delay`.
    pub fn schedule_once(&mut self, delay: Duration, message: M) -> TaskHandle {
        let tx = self.tx.clone();
        self.track(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(message);
        }))
    }

    /// Deliver `make()` every `period`, starting immediately, until cancelled
    /// or the receiver is gone.
    pub fn schedule_every<F>(&mut self, period: Duration, mut make: F) -> TaskHandle
    where
        F: FnMut() -> M + Send + 'static,
    {
        let tx = self.tx.clone();
        let period = period.max(Duration::from_millis(1));
        self.track(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(make()).is_err() {
                    break;
                }
            }
        }))
    }

    /// Number of tasks that have not yet finished.
    pub fn live_tasks(&mut self) -> usize {
        self.tasks.retain(|task| !task.is_finished());
        self.tasks.len()
    }

    pub fn cancel_all(&mut self) {
        let count = self.tasks.len();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if count > 0 {
            tracing::debug!(count, "Cancelled scheduled tasks");
        }
    }

    fn track(&mut self, task: JoinHandle<()>) -> TaskHandle {
        self.tasks.retain(|t| !t.is_finished());
        let handle = TaskHandle {
            abort: task.abort_handle(),
        };
        self.tasks.push(task);
        handle
    }
}

impl<M> Drop for TaskScheduler<M> {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
