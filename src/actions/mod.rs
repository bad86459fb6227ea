//! Button actions
//!
//! A rising edge on a button channel runs the action tokens configured for
//! that button through the key-input collaborator.
//!
//! # Components
//!
//! - [`ButtonMap`] - Swappable snapshot of the button -> tokens mapping
//! - [`ActionToken`] / [`KeyChord`] - Token resolution and chord building
//! - [`KeyInput`] - Boundary to the host key synthesizer
//! - [`ActionTrigger`] - Ties the three together for one button press

pub mod key_input;
pub mod mapping;
pub mod tokens;
pub mod trigger;

pub use key_input::{KeyInput, LoggingKeyInput};
pub use mapping::{ButtonMap, ButtonMapping};
pub use tokens::{ActionToken, HostKey, KeyChord, Modifiers};
pub use trigger::{ActionTrigger, FireOutcome};
