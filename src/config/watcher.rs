//! Configuration file watcher
//!
//! Polls the config file's modification time and pushes a freshly parsed
//! [`Config`] snapshot to its subscriber whenever it changes. A file that
//! fails to parse is reported and skipped; the previous snapshot stays in
//! effect until the file is fixed.

use crate::config::Config;
use crossbeam_channel::{bounded, tick, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Default interval between modification-time checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Watches one configuration file
pub struct ConfigWatcher {
    path: PathBuf,
    interval: Duration,
    last_modified: Option<SystemTime>,
    subscriber: Option<Sender<Arc<Config>>>,
    running: Arc<AtomicBool>,
}

impl ConfigWatcher {
    /// Create a watcher. The file's current state counts as already seen.
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        let path = path.into();
        let last_modified = modified(&path);
        Self {
            path,
            interval,
            last_modified,
            subscriber: None,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Receive a snapshot for every change. Only one subscription is
    /// active; subscribing again replaces the previous one.
    pub fn subscribe(&mut self) -> Receiver<Arc<Config>> {
        let (tx, rx) = bounded(1);
        self.subscriber = Some(tx);
        rx
    }

    /// Get a handle to stop the watcher
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Check the file once, publishing a snapshot if it changed and parses
    pub fn poll(&mut self) -> Option<Arc<Config>> {
        let current = modified(&self.path);
        if current == self.last_modified {
            return None;
        }
        self.last_modified = current;

        let config = match Config::load(&self.path) {
            Ok(config) => Arc::new(config),
            Err(e) => {
                tracing::warn!("Ignoring config change, keeping previous settings: {}", e);
                return None;
            }
        };

        tracing::info!("Config reloaded from {:?}", self.path);
        if let Some(subscriber) = &self.subscriber {
            if subscriber.send(config.clone()).is_err() {
                tracing::debug!("Config subscriber went away");
                self.subscriber = None;
            }
        }
        Some(config)
    }

    /// Poll until the stop handle is cleared
    pub fn run(mut self) {
        tracing::debug!("Watching {:?} for changes", self.path);
        let ticker = tick(self.interval);
        while self.running.load(Ordering::SeqCst) {
            if ticker.recv().is_err() {
                break;
            }
            self.poll();
        }
        tracing::debug!("Config watcher stopped");
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
