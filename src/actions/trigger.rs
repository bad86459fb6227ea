//! Rising-edge button actions
//!
//! [`ActionTrigger::fire`] looks up the pressed button's tokens, folds them
//! into a single [`KeyChord`] and hands it to the [`KeyInput`] collaborator.
//! Nothing that goes wrong here escapes: unknown tokens are skipped, and a
//! failing (or panicking) key-input call is logged and dropped so the serial
//! read loop keeps running.

use crate::actions::key_input::KeyInput;
use crate::actions::mapping::ButtonMap;
use crate::actions::tokens::{ActionToken, KeyChord};
use crate::types::ButtonPressEvent;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// What happened to one rising edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    /// No tokens are mapped to the button
    Unmapped,
    /// Tokens were mapped but none resolved to a key
    NothingToPress,
    /// The chord was issued
    Pressed(KeyChord),
    /// The key-input collaborator failed or panicked
    Failed(String),
}

/// Maps button presses to host key actions
#[derive(Clone)]
pub struct ActionTrigger {
    mapping: ButtonMap,
    keys: Arc<dyn KeyInput>,
}

impl ActionTrigger {
    pub fn new(mapping: ButtonMap, keys: Arc<dyn KeyInput>) -> Self {
        Self { mapping, keys }
    }

    /// The mapping this trigger reads from
    pub fn mapping(&self) -> &ButtonMap {
        &self.mapping
    }

    /// Resolve and issue the actions mapped to the pressed button
    pub fn fire(&self, event: &ButtonPressEvent) -> FireOutcome {
        let Some(tokens) = self.mapping.get(event.button_id) else {
            tracing::debug!("Button {} pressed with no mapped actions", event.button_id);
            return FireOutcome::Unmapped;
        };

        tracing::debug!("Button {} pressed: {:?}", event.button_id, tokens);

        let chord = resolve_chord(event.button_id, &tokens);
        if chord.is_empty() {
            return FireOutcome::NothingToPress;
        }

        let result = catch_unwind(AssertUnwindSafe(|| self.keys.press(&chord)));
        match result {
            Ok(Ok(())) => FireOutcome::Pressed(chord),
            Ok(Err(e)) => {
                tracing::warn!("Failed to press keys for button {}: {}", event.button_id, e);
                FireOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::warn!("Key input panicked for button {}", event.button_id);
                FireOutcome::Failed("key input panicked".to_string())
            }
        }
    }
}

/// Fold a button's tokens into one chord, skipping the ones that don't resolve
fn resolve_chord(button_id: usize, tokens: &[String]) -> KeyChord {
    let mut chord = KeyChord::default();
    for (index, token) in tokens.iter().enumerate() {
        match token.parse::<ActionToken>() {
            Ok(action) => chord.push(action),
            Err(e) => tracing::debug!("Button {} token #{} skipped: {}", button_id, index, e),
        }
    }
    chord
}
