//! Core data types for faderlink
//!
//! This module contains the value types that flow between the protocol
//! engine and its consumers.
//!
//! # Main Types
//!
//! - [`SliderMoveEvent`] - A slider settled on a new normalized position
//! - [`ButtonPressEvent`] - A button channel changed value
//! - [`NoiseReductionLevel`] - How aggressively slider jitter is suppressed
//! - [`ConnectionStatus`] - Lifecycle state of the serial connection
//!
//! Events are immutable values created by a channel tracker and handed to
//! subscribers; nothing shared travels with them.

use serde::{Deserialize, Serialize};

/// Highest raw reading the firmware's ADC produces
pub const MAX_RAW_SLIDER_VALUE: u16 = 1023;

/// Largest value accepted in the first field of a button frame
pub const MAX_RAW_BUTTON_VALUE: u8 = 9;

/// A slider moved far enough to count as a real change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderMoveEvent {
    /// Zero-based slider channel
    pub slider_id: usize,
    /// Normalized position in `[0.0, 1.0]` at two-decimal precision
    pub percent_value: f32,
}

/// A button channel changed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPressEvent {
    /// Zero-based button channel
    pub button_id: usize,
    /// Value before this frame, `None` when the channel was unset
    pub previous_value: Option<u8>,
    /// Value carried by this frame
    pub value: u8,
}

impl ButtonPressEvent {
    /// True for a 0 -> non-zero transition.
    ///
    /// The first observation of a channel after a reset is never an edge,
    /// so a button held down across a reconnect does not fire.
    pub fn is_rising_edge(&self) -> bool {
        self.previous_value == Some(0) && self.value != 0
    }
}

/// Slider noise suppression level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoiseReductionLevel {
    /// Small threshold, most responsive
    Low,
    /// Balanced threshold
    #[default]
    Default,
    /// Large threshold, fewest events
    High,
}

impl NoiseReductionLevel {
    /// Minimum change in normalized value that counts as a real move
    pub fn epsilon(&self) -> f32 {
        match self {
            NoiseReductionLevel::Low => 0.015,
            NoiseReductionLevel::Default => 0.025,
            NoiseReductionLevel::High => 0.035,
        }
    }
}

impl std::fmt::Display for NoiseReductionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoiseReductionLevel::Low => write!(f, "low"),
            NoiseReductionLevel::Default => write!(f, "default"),
            NoiseReductionLevel::High => write!(f, "high"),
        }
    }
}

/// Lifecycle state of a serial connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No link open
    #[default]
    Disconnected,
    /// Opening the link
    Connecting,
    /// Link open and the reader running
    Connected,
}

impl ConnectionStatus {
    /// Get display name for this status
    pub fn display_name(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
        }
    }
}
