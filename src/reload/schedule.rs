//! Delayed, cancellable one-shot tasks

use crossbeam_channel::{after, bounded, select, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

/// A closure that runs on its own thread after a delay unless cancelled
/// first. Dropping the handle cancels a task that has not fired yet.
pub struct ScheduledTask {
    name: &'static str,
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Run `task` after `delay`
    pub fn after<F>(name: &'static str, delay: Duration, task: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = bounded::<()>(0);
        let timer = after(delay);

        let handle = std::thread::Builder::new()
            .name(format!("scheduled-{}", name))
            .spawn(move || {
                select! {
                    recv(cancel_rx) -> _ => tracing::trace!("Scheduled {} cancelled", name),
                    recv(timer) -> _ => task(),
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("Failed to schedule {}: {}", name, e);
                None
            }
        };

        Self {
            name,
            cancel: Some(cancel_tx),
            handle,
        }
    }

    /// True once the task has run or been cancelled
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel the task if it has not fired yet
    pub fn cancel(&mut self) {
        if self.cancel.take().is_some() && !self.is_finished() {
            tracing::debug!("Superseding pending {}", self.name);
        }
    }

    /// Wait for the task to fire (or observe its cancellation)
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
