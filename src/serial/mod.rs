//! Serial connection lifecycle
//!
//! A [`SerialConnection`] owns the physical link to the control surface and
//! moves through `Disconnected -> Connecting -> Connected -> Disconnected`.
//!
//! # Threads
//!
//! A successful [`SerialConnection::start`] spawns two threads:
//!
//! - **reader** - reads bytes from the link and cuts them into lines
//! - **dispatcher** - waits on either the stop signal or the next line and
//!   runs lines through the [`FrameProcessor`]
//!
//! # Stopping
//!
//! The stop signal is a channel whose sender is dropped by
//! [`SerialConnection::stop`]. Every party selecting on it (the dispatcher,
//! a blocked event delivery, the reader between reads) sees the disconnect,
//! so one stop reaches all of them and stopping twice is harmless. `stop`
//! returns once the link has been released.
//!
//! # Link Loss
//!
//! A read error or end-of-stream ends the reader. The dispatcher then
//! releases the link and marks the connection `Disconnected`. There is no
//! automatic reconnect at this layer; only a configuration change that
//! alters the port or baud rate reconnects (see [`crate::reload`]).

pub mod link;

pub use link::{LinkOpener, SerialLink, SerialPortOpener};

use crate::config::ConnectionParameters;
use crate::error::{BridgeError, Result};
use crate::protocol::FrameProcessor;
use crate::types::ConnectionStatus;
use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// Lines buffered between the reader and the dispatcher
const LINE_QUEUE_CAPACITY: usize = 64;

/// Longest line the reader keeps; no valid frame comes close
const MAX_LINE_LENGTH: usize = 256;

struct ConnectionInner {
    params: ConnectionParameters,
    stop_tx: Option<Sender<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

/// Owns the physical link and the reader/dispatcher pair
pub struct SerialConnection {
    opener: Arc<dyn LinkOpener>,
    processor: Arc<FrameProcessor>,
    inner: Mutex<ConnectionInner>,
    status: Arc<Mutex<ConnectionStatus>>,
}

impl SerialConnection {
    pub fn new(
        params: ConnectionParameters,
        opener: Arc<dyn LinkOpener>,
        processor: Arc<FrameProcessor>,
    ) -> Self {
        Self {
            opener,
            processor,
            inner: Mutex::new(ConnectionInner {
                params,
                stop_tx: None,
                dispatcher: None,
            }),
            status: Arc::new(Mutex::new(ConnectionStatus::Disconnected)),
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> ConnectionStatus {
        *lock(&self.status)
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Parameters used by the next `start`
    pub fn parameters(&self) -> ConnectionParameters {
        lock(&self.inner).params.clone()
    }

    /// Replace the parameters used by the next `start`. An open link is
    /// not affected.
    pub fn set_parameters(&self, params: ConnectionParameters) {
        lock(&self.inner).params = params;
    }

    /// The processor lines are handed to
    pub fn processor(&self) -> &Arc<FrameProcessor> {
        &self.processor
    }

    /// Open the link and start reading.
    ///
    /// Fails if already connected, or if the link cannot be opened; in the
    /// latter case the connection stays `Disconnected` and nothing retries.
    pub fn start(&self) -> Result<()> {
        let mut inner = lock(&self.inner);

        if self.status() == ConnectionStatus::Connected {
            tracing::warn!("Already connected, can't start another without closing first");
            return Err(BridgeError::AlreadyConnected);
        }

        // A dispatcher that ended on link loss has already released the link
        if let Some(handle) = inner.dispatcher.take() {
            let _ = handle.join();
        }

        let params = inner.params.clone();
        tracing::debug!(
            "Attempting serial connection: port={} baud_rate={} min_read_size={}",
            params.port,
            params.baud_rate,
            params.min_read_size
        );

        self.set_status(ConnectionStatus::Connecting);
        let link = match self.opener.open(&params) {
            Ok(link) => link,
            Err(e) => {
                self.set_status(ConnectionStatus::Disconnected);
                tracing::warn!("Failed to open serial connection: {}", e);
                return Err(e);
            }
        };

        // Every channel re-emits its first reading on the new link
        self.processor.reset_channels();

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let (line_tx, line_rx) = bounded::<String>(LINE_QUEUE_CAPACITY);

        let port = params.port.clone();
        let reader = {
            let stop_rx = stop_rx.clone();
            let port = port.clone();
            std::thread::Builder::new()
                .name(format!("serial-reader-{}", port))
                .spawn(move || read_lines(link, line_tx, stop_rx, &port))?
        };

        let dispatcher = {
            let processor = self.processor.clone();
            let status = self.status.clone();
            std::thread::Builder::new()
                .name(format!("serial-dispatch-{}", port))
                .spawn(move || dispatch(processor, line_rx, stop_rx, reader, status, &port))?
        };

        inner.stop_tx = Some(stop_tx);
        inner.dispatcher = Some(dispatcher);
        self.set_status(ConnectionStatus::Connected);
        tracing::info!("Connected to {} at {} baud", params.port, params.baud_rate);

        Ok(())
    }

    /// Close the link if one is open; a no-op otherwise.
    ///
    /// Returns after the reader and dispatcher have exited and the link has
    /// been released.
    pub fn stop(&self) {
        let (stop_tx, dispatcher) = {
            let mut inner = lock(&self.inner);
            if self.status() != ConnectionStatus::Connected {
                tracing::debug!("Not currently connected, nothing to stop");
                return;
            }
            tracing::debug!("Shutting down serial connection");
            (inner.stop_tx.take(), inner.dispatcher.take())
        };

        drop(stop_tx);
        if let Some(handle) = dispatcher {
            if handle.join().is_err() {
                tracing::warn!("Serial dispatcher panicked");
            }
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    fn set_status(&self, status: ConnectionStatus) {
        *lock(&self.status) = status;
    }
}

impl Drop for SerialConnection {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Dispatcher loop: one line at a time until stopped or the reader ends
fn dispatch(
    processor: Arc<FrameProcessor>,
    lines: Receiver<String>,
    stop: Receiver<()>,
    reader: JoinHandle<()>,
    status: Arc<Mutex<ConnectionStatus>>,
    port: &str,
) {
    let link_lost = loop {
        select! {
            recv(stop) -> _ => break false,
            recv(lines) -> msg => match msg {
                Ok(line) => {
                    processor.handle_line_until(&line, &stop);
                }
                Err(_) => break true,
            },
        }
    };

    // Unblock a reader waiting on a full line queue
    drop(lines);
    if reader.join().is_err() {
        tracing::warn!("Serial reader for {} panicked", port);
    }

    if link_lost {
        tracing::warn!("Lost serial connection to {}, not reconnecting", port);
        *lock(&status) = ConnectionStatus::Disconnected;
    } else {
        tracing::debug!("Serial connection to {} closed", port);
    }
}

/// Reader loop: cuts the byte stream into `\n`-terminated lines
fn read_lines(link: Box<dyn SerialLink>, lines: Sender<String>, stop: Receiver<()>, port: &str) {
    let mut reader = BufReader::new(link);
    let mut buf = Vec::new();
    // Set while skipping the rest of an overlong line
    let mut discarding = false;

    loop {
        if matches!(stop.try_recv(), Err(TryRecvError::Disconnected)) {
            break;
        }

        let limit = (MAX_LINE_LENGTH + 1).saturating_sub(buf.len()) as u64;
        match (&mut reader).take(limit).read_until(b'\n', &mut buf) {
            Ok(0) => {
                tracing::warn!("Serial link {} reached end of stream", port);
                break;
            }
            Ok(_) if buf.last() == Some(&b'\n') => {
                if discarding {
                    discarding = false;
                    buf.clear();
                    continue;
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();
                tracing::trace!("Read new line: {:?}", line);
                if lines.send(line).is_err() {
                    break;
                }
            }
            Ok(_) if buf.len() > MAX_LINE_LENGTH => {
                if !discarding {
                    tracing::debug!("Dropping overlong line from {}", port);
                }
                discarding = true;
                buf.clear();
            }
            // Partial line; the rest arrives with the next read
            Ok(_) => {}
            Err(e) if is_transient(&e) => {}
            Err(e) => {
                tracing::warn!("Failed to read line from {}: {}", port, e);
                break;
            }
        }
    }
    // Dropping the reader releases the link
}

fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
