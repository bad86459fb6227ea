//! # faderlink: Serial Control Surface Bridge
//!
//! Bridges a microcontroller with analog sliders and momentary buttons to
//! host-side actions. The microcontroller prints one status line per sample
//! over a serial link; faderlink turns those lines into a validated,
//! noise-filtered event stream and hands each change to whoever is
//! interested exactly once.
//!
//! ## Architecture
//!
//! - **Serial**: [`serial::SerialConnection`] owns the link and runs a reader
//!   thread plus a dispatcher thread per connection
//! - **Protocol**: [`protocol::FrameProcessor`] parses lines, tracks
//!   per-channel state and produces [`SliderMoveEvent`]s and
//!   [`ButtonPressEvent`]s
//! - **Bus**: [`bus::EventBus`] fans events out to subscriber queues
//! - **Actions**: [`actions::ActionTrigger`] turns button presses into host
//!   key chords
//! - **Reload**: [`reload::ReloadCoordinator`] applies config changes,
//!   resetting trackers and reconnecting when the port or baud rate changes
//! - **Communication**: Crossbeam channels between every pair of threads
//!
//! ## Example
//!
//! ```ignore
//! use faderlink::actions::{ActionTrigger, ButtonMap, LoggingKeyInput};
//! use faderlink::protocol::FrameProcessor;
//! use faderlink::serial::{SerialConnection, SerialPortOpener};
//! use faderlink::Config;
//! use std::sync::Arc;
//!
//! let config = Config::load("config.toml")?;
//! let trigger = ActionTrigger::new(
//!     ButtonMap::new(config.button_mapping()),
//!     Arc::new(LoggingKeyInput),
//! );
//! let processor = Arc::new(FrameProcessor::new(
//!     trigger,
//!     config.invert_sliders,
//!     config.noise_reduction,
//! ));
//! let sliders = processor.subscribe_sliders();
//!
//! let connection = SerialConnection::new(
//!     config.connection_parameters(),
//!     Arc::new(SerialPortOpener),
//!     processor,
//! );
//! connection.start()?;
//!
//! for event in sliders.iter() {
//!     println!("slider {} -> {:.2}", event.slider_id, event.percent_value);
//! }
//! ```

pub mod actions;
pub mod bus;
pub mod config;
pub mod error;
pub mod protocol;
pub mod reload;
pub mod serial;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConnectionParameters};
pub use error::{BridgeError, Result};
pub use protocol::FrameProcessor;
pub use reload::ReloadCoordinator;
pub use serial::SerialConnection;
pub use types::{ButtonPressEvent, ConnectionStatus, NoiseReductionLevel, SliderMoveEvent};
