//! Slider channel state tracking
//!
//! Turns raw [`SliderFrame`]s into [`SliderMoveEvent`]s. Readings are
//! normalized to `[0.0, 1.0]`, optionally inverted, and compared against the
//! last emitted value with the configured noise epsilon so ADC jitter does
//! not turn into a stream of volume changes.
//!
//! Channels start out unset. An unset channel always emits on its next
//! reading, which is how consumers get an initial value after a connect,
//! a reload, or a change in the number of sliders.

use crate::protocol::grammar::SliderFrame;
use crate::types::{NoiseReductionLevel, SliderMoveEvent, MAX_RAW_SLIDER_VALUE};

/// Normalize a raw ADC reading to `[0.0, 1.0]` at two-decimal precision
pub fn normalize(raw: u16) -> f32 {
    let scalar = (raw as f32 / MAX_RAW_SLIDER_VALUE as f32).clamp(0.0, 1.0);
    (scalar * 100.0).round() / 100.0
}

/// Per-channel slider state
#[derive(Debug, Clone, Default)]
pub struct SliderTracker {
    /// Last emitted value per channel, `None` while unset
    current: Vec<Option<f32>>,
    /// Replace readings with their complement from 1.0
    invert: bool,
    /// Jitter suppression level
    noise_reduction: NoiseReductionLevel,
}

impl SliderTracker {
    /// Create a tracker with no known channels
    pub fn new(invert: bool, noise_reduction: NoiseReductionLevel) -> Self {
        Self {
            current: Vec::new(),
            invert,
            noise_reduction,
        }
    }

    /// Update inversion and noise settings without touching channel state
    pub fn configure(&mut self, invert: bool, noise_reduction: NoiseReductionLevel) {
        self.invert = invert;
        self.noise_reduction = noise_reduction;
    }

    /// Forget the channel count so the next frame re-emits every channel
    pub fn reset(&mut self) {
        self.current.clear();
    }

    /// Number of channels seen in the last frame
    pub fn channel_count(&self) -> usize {
        self.current.len()
    }

    /// Apply a frame, returning one event per channel that moved
    pub fn apply(&mut self, frame: &SliderFrame) -> Vec<SliderMoveEvent> {
        if frame.values.len() != self.current.len() {
            tracing::info!("Detected sliders: {}", frame.values.len());
            self.current = vec![None; frame.values.len()];
        }

        let epsilon = self.noise_reduction.epsilon();
        let mut events = Vec::new();

        for (slider_id, (&raw, last)) in frame
            .values
            .iter()
            .zip(self.current.iter_mut())
            .enumerate()
        {
            let mut value = normalize(raw);
            if self.invert {
                value = 1.0 - value;
            }

            let changed = match *last {
                None => true,
                Some(previous) => (previous - value).abs() > epsilon,
            };

            if changed {
                *last = Some(value);
                let event = SliderMoveEvent {
                    slider_id,
                    percent_value: value,
                };
                tracing::trace!("Slider moved: {:?}", event);
                events.push(event);
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(values: &[u16]) -> SliderFrame {
        SliderFrame {
            values: values.to_vec(),
        }
    }

    fn values(events: &[SliderMoveEvent]) -> Vec<f32> {
        events.iter().map(|e| e.percent_value).collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0), 0.0);
        assert_eq!(normalize(512), 0.5);
        assert_eq!(normalize(1023), 1.0);
        assert_eq!(normalize(4000), 1.0);
    }

    #[test]
    fn test_first_frame_emits_every_channel() {
        let mut tracker = SliderTracker::default();
        let events = tracker.apply(&frame(&[512, 1023, 0]));

        assert_eq!(events.len(), 3);
        assert_eq!(values(&events), vec![0.5, 1.0, 0.0]);
        assert_eq!(
            events.iter().map(|e| e.slider_id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_same_frame_twice_is_idempotent() {
        let mut tracker = SliderTracker::default();
        tracker.apply(&frame(&[100, 200, 300]));
        assert!(tracker.apply(&frame(&[100, 200, 300])).is_empty());
    }

    #[test]
    fn test_jitter_within_epsilon_is_suppressed() {
        let mut tracker = SliderTracker::new(false, NoiseReductionLevel::Default);
        tracker.apply(&frame(&[512, 512]));

        // +10 raw is ~0.01, below the default epsilon; +60 raw is ~0.06
        let events = tracker.apply(&frame(&[522, 572]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].slider_id, 1);
        assert_eq!(events[0].percent_value, 0.56);
    }

    #[test]
    fn test_noise_level_changes_sensitivity() {
        let mut low = SliderTracker::new(false, NoiseReductionLevel::Low);
        let mut high = SliderTracker::new(false, NoiseReductionLevel::High);
        low.apply(&frame(&[512]));
        high.apply(&frame(&[512]));

        // 0.50 -> 0.53 moves by 0.03: above low (0.015), below high (0.035)
        assert_eq!(low.apply(&frame(&[542])).len(), 1);
        assert!(high.apply(&frame(&[542])).is_empty());
    }

    #[test]
    fn test_channel_count_change_resyncs_all_channels() {
        let mut tracker = SliderTracker::default();
        tracker.apply(&frame(&[10, 20]));
        assert_eq!(tracker.channel_count(), 2);

        let events = tracker.apply(&frame(&[10, 20, 30, 40]));
        assert_eq!(events.len(), 4);
        assert_eq!(tracker.channel_count(), 4);
    }

    #[test]
    fn test_inversion() {
        let mut tracker = SliderTracker::new(true, NoiseReductionLevel::Default);
        let events = tracker.apply(&frame(&[0, 1023]));
        assert_eq!(values(&events), vec![1.0, 0.0]);
    }

    #[test]
    fn test_reset_forces_re_emission() {
        let mut tracker = SliderTracker::default();
        tracker.apply(&frame(&[1, 2, 3]));
        tracker.reset();
        assert_eq!(tracker.channel_count(), 0);
        assert_eq!(tracker.apply(&frame(&[1, 2, 3])).len(), 3);
    }

    #[test]
    fn test_configure_keeps_state() {
        let mut tracker = SliderTracker::default();
        tracker.apply(&frame(&[512]));
        tracker.configure(false, NoiseReductionLevel::High);
        assert!(tracker.apply(&frame(&[512])).is_empty());
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_emitted_values_stay_in_range(
            raws in prop::collection::vec(0u16..=9999, 1..8),
            invert in any::<bool>(),
        ) {
            let mut tracker = SliderTracker::new(invert, NoiseReductionLevel::Default);
            for event in tracker.apply(&frame(&raws)) {
                prop_assert!((0.0..=1.0).contains(&event.percent_value));
            }
        }

        #[test]
        fn test_events_only_for_channels_beyond_epsilon(
            first in prop::collection::vec(0u16..=1023, 4),
            second in prop::collection::vec(0u16..=1023, 4),
        ) {
            let mut tracker = SliderTracker::default();
            tracker.apply(&frame(&first));
            let events = tracker.apply(&frame(&second));

            let epsilon = NoiseReductionLevel::Default.epsilon();
            let expected: Vec<usize> = (0..4)
                .filter(|&i| (normalize(first[i]) - normalize(second[i])).abs() > epsilon)
                .collect();
            let actual: Vec<usize> = events.iter().map(|e| e.slider_id).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
