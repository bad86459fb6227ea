//! Error handling for faderlink
//!
//! This module defines custom error types and a Result alias for use
//! throughout the crate.
//!
//! Only link-open and reconnect failures ever reach the operator. Protocol
//! noise, unknown action tokens and key-input failures are absorbed where
//! they happen and only show up in the log.

use thiserror::Error;

/// Main error type for faderlink operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// `start` was called on a connection that is already open
    #[error("Serial connection already active")]
    AlreadyConnected,

    /// Errors reported by the serial port driver
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors related to configuration loading
    #[error("Configuration error: {0}")]
    Config(String),

    /// The key-input collaborator failed to initialize or to issue a chord
    #[error("Key input error: {0}")]
    KeyInput(String),

    /// An action token that does not name a known key or combo
    #[error("Unknown action token: {0}")]
    UnknownToken(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<BridgeError>,
    },
}

impl BridgeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        BridgeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for faderlink operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::UnknownToken("VK_NOPE".to_string());
        assert_eq!(err.to_string(), "Unknown action token: VK_NOPE");
    }

    #[test]
    fn test_error_with_context() {
        let err = BridgeError::Config("missing port".to_string());
        let with_ctx = err.with_context("Failed to load config.toml");
        assert!(with_ctx.to_string().contains("Failed to load config.toml"));
        assert!(with_ctx.to_string().contains("missing port"));
    }

    #[test]
    fn test_result_ext_lazy_context() {
        let res: Result<()> = Err(BridgeError::AlreadyConnected);
        let err = res.with_context(|| "open /dev/ttyACM0".to_string()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "open /dev/ttyACM0: Serial connection already active"
        );
    }
}
