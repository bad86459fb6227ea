//! Serial protocol engine
//!
//! Everything between a raw line read from the link and the events that
//! leave the crate:
//!
//! - [`grammar`] - classifies a line as a slider frame, a button frame, or noise
//! - [`sliders`] - normalizes readings and filters jitter
//! - [`buttons`] - detects value changes per button
//! - [`FrameProcessor`] - runs a line through the above and dispatches the
//!   resulting events
//!
//! # Dispatch
//!
//! Slider moves go to the slider [`EventBus`]. Button changes go to the
//! button bus, and every rising edge additionally fires the
//! [`ActionTrigger`] before the line is considered handled.
//!
//! Tracker state is computed under its lock and the lock is released before
//! dispatching, so a reload-driven reset never waits on a slow subscriber.

pub mod buttons;
pub mod grammar;
pub mod sliders;

pub use buttons::ButtonTracker;
pub use grammar::{parse_line, ButtonFrame, Frame, SliderFrame};
pub use sliders::{normalize, SliderTracker};

use crate::actions::ActionTrigger;
use crate::bus::{Delivery, EventBus};
use crate::types::{ButtonPressEvent, NoiseReductionLevel, SliderMoveEvent};
use crossbeam_channel::{never, Receiver};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Parses lines and dispatches the events they produce
pub struct FrameProcessor {
    sliders: Mutex<SliderTracker>,
    buttons: Mutex<ButtonTracker>,
    slider_bus: EventBus<SliderMoveEvent>,
    button_bus: EventBus<ButtonPressEvent>,
    trigger: ActionTrigger,
}

impl FrameProcessor {
    /// Create a processor with default (blocking) event buses
    pub fn new(trigger: ActionTrigger, invert: bool, noise_reduction: NoiseReductionLevel) -> Self {
        Self::with_buses(
            trigger,
            invert,
            noise_reduction,
            EventBus::default(),
            EventBus::default(),
        )
    }

    /// Create a processor with caller-provided event buses
    pub fn with_buses(
        trigger: ActionTrigger,
        invert: bool,
        noise_reduction: NoiseReductionLevel,
        slider_bus: EventBus<SliderMoveEvent>,
        button_bus: EventBus<ButtonPressEvent>,
    ) -> Self {
        Self {
            sliders: Mutex::new(SliderTracker::new(invert, noise_reduction)),
            buttons: Mutex::new(ButtonTracker::new()),
            slider_bus,
            button_bus,
            trigger,
        }
    }

    /// Subscribe to slider move events
    pub fn subscribe_sliders(&self) -> Receiver<SliderMoveEvent> {
        self.slider_bus.subscribe()
    }

    /// Subscribe to button change events (presses and releases)
    pub fn subscribe_buttons(&self) -> Receiver<ButtonPressEvent> {
        self.button_bus.subscribe()
    }

    /// End a slider subscription on a drop-oldest bus
    pub fn unsubscribe_sliders(&self, receiver: &Receiver<SliderMoveEvent>) -> bool {
        self.slider_bus.unsubscribe(receiver)
    }

    /// End a button subscription on a drop-oldest bus
    pub fn unsubscribe_buttons(&self, receiver: &Receiver<ButtonPressEvent>) -> bool {
        self.button_bus.unsubscribe(receiver)
    }

    /// The action trigger fired on rising edges
    pub fn trigger(&self) -> &ActionTrigger {
        &self.trigger
    }

    /// Update slider inversion and noise reduction
    pub fn configure_sliders(&self, invert: bool, noise_reduction: NoiseReductionLevel) {
        lock(&self.sliders).configure(invert, noise_reduction);
    }

    /// Forget both trackers' channel counts so every channel re-emits
    pub fn reset_channels(&self) {
        lock(&self.sliders).reset();
        lock(&self.buttons).reset();
        tracing::debug!("Channel state reset, next frames re-emit every channel");
    }

    /// Handle one raw line, waiting on subscribers for as long as it takes
    pub fn handle_line(&self, line: &str) -> Delivery {
        self.handle_line_until(line, &never())
    }

    /// Handle one raw line; blocked deliveries give up once `stop` fires
    pub fn handle_line_until(&self, line: &str, stop: &Receiver<()>) -> Delivery {
        match parse_line(line) {
            Frame::Sliders(frame) => {
                let events = lock(&self.sliders).apply(&frame);
                self.slider_bus.publish_until(&events, stop)
            }
            Frame::Buttons(frame) => {
                let events = lock(&self.buttons).apply(&frame);
                for event in events.iter().filter(|e| e.is_rising_edge()) {
                    self.trigger.fire(event);
                }
                self.button_bus.publish_until(&events, stop)
            }
            Frame::Malformed => Delivery::Complete,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::key_input::MockKeyInput;
    use crate::actions::{ButtonMap, ButtonMapping, HostKey};
    use std::sync::Arc;

    fn processor_with(keys: MockKeyInput, mapping: ButtonMapping) -> FrameProcessor {
        let trigger = ActionTrigger::new(ButtonMap::new(mapping), Arc::new(keys));
        FrameProcessor::new(trigger, false, NoiseReductionLevel::Default)
    }

    fn idle_processor() -> FrameProcessor {
        let mut keys = MockKeyInput::new();
        keys.expect_press().times(0);
        processor_with(keys, ButtonMapping::new())
    }

    #[test]
    fn test_slider_line_reaches_subscribers() {
        let processor = idle_processor();
        let rx = processor.subscribe_sliders();

        processor.handle_line("512|1023|0\r\n");

        let values: Vec<f32> = rx.try_iter().map(|e| e.percent_value).collect();
        assert_eq!(values, vec![0.5, 1.0, 0.0]);
    }

    #[test]
    fn test_malformed_line_changes_nothing() {
        let processor = idle_processor();
        let rx = processor.subscribe_sliders();
        processor.handle_line("10|20|30|40|50\r\n");
        rx.try_iter().for_each(drop);

        processor.handle_line("4558|925|41|643|220\r\n");

        assert!(rx.try_recv().is_err());
        assert_eq!(lock(&processor.sliders).channel_count(), 5);
    }

    #[test]
    fn test_rising_edge_fires_action_once() {
        let mut keys = MockKeyInput::new();
        keys.expect_press()
            .withf(|chord| chord.keys == vec![HostKey::MediaNextTrack])
            .times(1)
            .returning(|_| Ok(()));
        let mut mapping = ButtonMapping::new();
        mapping.insert(2, vec!["VK_MEDIA_NEXT_TRACK".to_string()]);
        let processor = processor_with(keys, mapping);

        processor.handle_line("~0~0~0~\r\n");
        processor.handle_line("~0~0~1~\r\n");
        processor.handle_line("~0~0~1~\r\n");
        processor.handle_line("~0~0~0~\r\n");
    }

    #[test]
    fn test_button_events_are_published() {
        let processor = idle_processor();
        let rx = processor.subscribe_buttons();

        processor.handle_line("~0~1~0~\r\n");
        processor.handle_line("~0~0~0~\r\n");

        let events: Vec<ButtonPressEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[3],
            ButtonPressEvent {
                button_id: 1,
                previous_value: Some(1),
                value: 0,
            }
        );
    }

    #[test]
    fn test_reset_channels_re_emits() {
        let processor = idle_processor();
        let rx = processor.subscribe_sliders();

        processor.handle_line("100|200\r\n");
        processor.handle_line("100|200\r\n");
        assert_eq!(rx.try_iter().count(), 2);

        processor.reset_channels();
        processor.handle_line("100|200\r\n");
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn test_configure_sliders_inverts() {
        let processor = idle_processor();
        let rx = processor.subscribe_sliders();

        processor.configure_sliders(true, NoiseReductionLevel::Low);
        processor.handle_line("0|1023\r\n");

        let values: Vec<f32> = rx.try_iter().map(|e| e.percent_value).collect();
        assert_eq!(values, vec![1.0, 0.0]);
    }

    #[test]
    fn test_drop_oldest_slider_subscription_ends() {
        let mut keys = MockKeyInput::new();
        keys.expect_press().times(0);
        let trigger = ActionTrigger::new(ButtonMap::default(), Arc::new(keys));
        let processor = FrameProcessor::with_buses(
            trigger,
            false,
            NoiseReductionLevel::Default,
            EventBus::new(4, crate::bus::Backpressure::DropOldest),
            EventBus::default(),
        );

        let rx = processor.subscribe_sliders();
        processor.handle_line("100\r\n");
        assert_eq!(rx.try_iter().count(), 1);

        assert!(processor.unsubscribe_sliders(&rx));
        processor.reset_channels();
        processor.handle_line("100\r\n");
        assert!(rx.try_recv().is_err());
    }
}
