//! Physical link boundary
//!
//! [`LinkOpener`] opens a byte stream for a set of [`ConnectionParameters`].
//! The production implementation, [`SerialPortOpener`], goes through the
//! `serialport` crate; tests substitute in-memory links.
//!
//! Links must not block forever in `read`: the reader thread relies on reads
//! returning `ErrorKind::TimedOut` (or `WouldBlock`) periodically so it can
//! notice a stop request and release the port.

use crate::config::ConnectionParameters;
use crate::error::{BridgeError, Result, ResultExt};
use std::io::Read;

/// An open, readable physical link
pub trait SerialLink: Read + Send {}

impl<T: Read + Send> SerialLink for T {}

/// Opens physical links
pub trait LinkOpener: Send + Sync {
    /// Open a link with the given parameters
    fn open(&self, params: &ConnectionParameters) -> Result<Box<dyn SerialLink>>;
}

/// Opens real serial ports
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialPortOpener;

impl LinkOpener for SerialPortOpener {
    fn open(&self, params: &ConnectionParameters) -> Result<Box<dyn SerialLink>> {
        let port = serialport::new(&params.port, params.baud_rate)
            .data_bits(data_bits(params.data_bits)?)
            .stop_bits(stop_bits(params.stop_bits)?)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .timeout(params.read_timeout())
            .open()
            .map_err(BridgeError::from)
            .with_context(|| format!("Failed to open {}", params.port))?;

        Ok(Box::new(port))
    }
}

fn data_bits(bits: u8) -> Result<serialport::DataBits> {
    match bits {
        5 => Ok(serialport::DataBits::Five),
        6 => Ok(serialport::DataBits::Six),
        7 => Ok(serialport::DataBits::Seven),
        8 => Ok(serialport::DataBits::Eight),
        other => Err(BridgeError::Config(format!("Unsupported data bits: {}", other))),
    }
}

fn stop_bits(bits: u8) -> Result<serialport::StopBits> {
    match bits {
        1 => Ok(serialport::StopBits::One),
        2 => Ok(serialport::StopBits::Two),
        other => Err(BridgeError::Config(format!("Unsupported stop bits: {}", other))),
    }
}
