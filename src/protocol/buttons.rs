//! Button channel state tracking
//!
//! Buttons are already debounced by the firmware, so there is no noise
//! threshold: any change in a channel's value produces a [`ButtonPressEvent`].
//! Rising-edge handling lives in [`crate::protocol::FrameProcessor`].

use crate::protocol::grammar::ButtonFrame;
use crate::types::ButtonPressEvent;

/// Per-channel button state
#[derive(Debug, Clone, Default)]
pub struct ButtonTracker {
    /// Last emitted value per channel, `None` while unset
    current: Vec<Option<u8>>,
}

impl ButtonTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the channel count so the next frame re-emits every channel
    pub fn reset(&mut self) {
        self.current.clear();
    }

    /// Number of channels seen in the last frame
    pub fn channel_count(&self) -> usize {
        self.current.len()
    }

    /// Apply a frame, returning one event per channel that changed
    pub fn apply(&mut self, frame: &ButtonFrame) -> Vec<ButtonPressEvent> {
        if frame.values.len() != self.current.len() {
            tracing::info!("Detected buttons: {}", frame.values.len());
            self.current = vec![None; frame.values.len()];
        }

        let mut events = Vec::new();
        for (button_id, (&value, last)) in frame
            .values
            .iter()
            .zip(self.current.iter_mut())
            .enumerate()
        {
            if *last != Some(value) {
                let event = ButtonPressEvent {
                    button_id,
                    previous_value: *last,
                    value,
                };
                *last = Some(value);
                tracing::trace!("Button state changed: {:?}", event);
                events.push(event);
            }
        }

        events
    }
}
