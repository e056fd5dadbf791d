//! UI dispatch
//!
//! The core never touches widgets. Every observer notification is wrapped in
//! a task and handed to one injected dispatcher, which runs tasks one at a
//! time, in submission order, on whatever thread the host treats as its UI
//! thread.

use crate::error::Result;
use crossbeam_channel::{unbounded, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// A unit of UI work
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Delivers tasks to the UI-update context
///
/// Implementations must run tasks in FIFO order and never two at once.
/// Closures `Fn(UiTask)` implement this, so a host event loop can be plugged
/// in directly (e.g. `|task| event_loop_proxy.send(task)`).
pub trait UiDispatcher: Send + Sync {
    /// Queue (or run) a task on the UI context
    fn dispatch(&self, task: UiTask);
}

impl<F> UiDispatcher for F
where
    F: Fn(UiTask) + Send + Sync,
{
    fn dispatch(&self, task: UiTask) {
        self(task);
    }
}

/// Runs every task immediately on the calling thread
///
/// For tests and single-threaded hosts. Listeners run while the caller is
/// inside a session or controller operation, so they must not call back into
/// the session; use [`ThreadDispatcher`] when they need to.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

impl UiDispatcher for InlineDispatcher {
    fn dispatch(&self, task: UiTask) {
        task();
    }
}

/// Owns a dedicated UI-update thread fed by a FIFO queue
///
/// A panicking task is logged and does not take the thread down.
pub struct ThreadDispatcher {
    tasks: Option<Sender<UiTask>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadDispatcher {
    /// Spawn the UI thread
    pub fn spawn() -> Result<Self> {
        let (tasks, queue) = unbounded::<UiTask>();

        let handle = thread::Builder::new()
            .name("mellow-ui".to_string())
            .spawn(move || {
                for task in queue {
                    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                        error!("UI task panicked");
                    }
                }
                debug!("UI thread exiting");
            })?;

        Ok(Self {
            tasks: Some(tasks),
            handle: Some(handle),
        })
    }

    /// Block until every task queued before this call has run
    ///
    /// Must not be called from the UI thread itself.
    pub fn flush(&self) {
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        self.dispatch(Box::new(move || {
            done_tx.send(()).ok();
        }));
        done_rx.recv().ok();
    }
}

impl UiDispatcher for ThreadDispatcher {
    fn dispatch(&self, task: UiTask) {
        if let Some(tasks) = &self.tasks {
            if tasks.send(task).is_err() {
                error!("UI thread is gone, dropping task");
            }
        }
    }
}

impl Drop for ThreadDispatcher {
    fn drop(&mut self) {
        // Closing the queue ends the thread once pending tasks have run.
        self.tasks.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                handle.join().ok();
            }
        }
    }
}
