//! Reacting to configuration changes
//!
//! The [`ReloadCoordinator`] receives a fresh [`Config`] snapshot for every
//! change of the configuration file and:
//!
//! 1. applies slider settings and installs the new button mapping right away
//! 2. after a short grace delay, resets both channel trackers so every
//!    channel re-emits; the delay gives collaborators that rebuild their own
//!    state on reload (e.g. audio session maps) time to be ready for it
//! 3. if the port or baud rate changed, stops the connection, waits the
//!    same grace delay for the port to be released, and starts it again
//!
//! Both delayed steps are [`ScheduledTask`]s owned by the coordinator. A
//! newer reload supersedes a pending reset; a pending reconnect is only
//! superseded by a newer reload that itself needs a reconnect. A failed
//! reconnect is logged and leaves the connection `Disconnected`.

pub mod schedule;

pub use schedule::ScheduledTask;

use crate::config::Config;
use crate::serial::SerialConnection;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Pause between a config change and the resets/reconnects it causes
pub const GRACE_DELAY: Duration = Duration::from_millis(50);

/// Applies configuration changes to a running connection
pub struct ReloadCoordinator {
    connection: Arc<SerialConnection>,
    grace_delay: Duration,
    pending_reset: Option<ScheduledTask>,
    pending_reconnect: Option<ScheduledTask>,
}

impl ReloadCoordinator {
    pub fn new(connection: Arc<SerialConnection>) -> Self {
        Self::with_grace_delay(connection, GRACE_DELAY)
    }

    /// Create a coordinator with a custom grace delay
    pub fn with_grace_delay(connection: Arc<SerialConnection>, grace_delay: Duration) -> Self {
        Self {
            connection,
            grace_delay,
            pending_reset: None,
            pending_reconnect: None,
        }
    }

    /// Handle one configuration change
    pub fn handle_change(&mut self, config: &Config) {
        let processor = self.connection.processor().clone();

        processor.configure_sliders(config.invert_sliders, config.noise_reduction);
        processor.trigger().mapping().install(config.button_mapping());

        self.pending_reset = Some(ScheduledTask::after("channel reset", self.grace_delay, {
            let processor = processor.clone();
            move || processor.reset_channels()
        }));

        let params = config.connection_parameters();
        if self.connection.parameters().same_link(&params) {
            return;
        }

        tracing::info!(
            "Detected change in connection parameters ({} @ {}), attempting to renew connection",
            params.port,
            params.baud_rate
        );
        if let Some(mut pending) = self.pending_reconnect.take() {
            pending.cancel();
        }
        self.connection.stop();
        self.connection.set_parameters(params);

        self.pending_reconnect = Some(ScheduledTask::after("reconnect", self.grace_delay, {
            let connection = self.connection.clone();
            move || match connection.start() {
                Ok(()) => tracing::debug!("Renewed connection successfully"),
                Err(e) => {
                    tracing::warn!("Failed to renew connection after parameter change: {}", e)
                }
            }
        }));
    }

    /// True while a reset or reconnect is still waiting on its delay
    pub fn has_pending(&self) -> bool {
        let waiting =
            |task: &Option<ScheduledTask>| task.as_ref().is_some_and(|t| !t.is_finished());
        waiting(&self.pending_reset) || waiting(&self.pending_reconnect)
    }

    /// Handle notifications until the sender side goes away.
    ///
    /// Pending tasks are allowed to finish before returning.
    pub fn run(mut self, notifications: Receiver<Arc<Config>>) {
        tracing::debug!("Listening for configuration changes");
        for config in notifications.iter() {
            self.handle_change(&config);
        }
        for task in [self.pending_reset.take(), self.pending_reconnect.take()]
            .into_iter()
            .flatten()
        {
            task.join();
        }
        tracing::debug!("Configuration listener stopped");
    }

    /// Run the listener on its own thread
    pub fn spawn(self, notifications: Receiver<Arc<Config>>) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("config-reload".to_string())
            .spawn(move || self.run(notifications))
    }
}
