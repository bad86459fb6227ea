//! Key-input collaborator boundary
//!
//! The host side that actually synthesizes key presses lives behind the
//! [`KeyInput`] trait. Each call is one complete "set keys, set modifiers,
//! issue" round trip; an implementation that needs an OS handle acquires it
//! inside `press`, so a failure to initialize is reported for that call
//! only.

use crate::actions::tokens::KeyChord;
use crate::error::Result;

/// Issues key chords on the host
#[cfg_attr(test, mockall::automock)]
pub trait KeyInput: Send + Sync {
    /// Press and release every key of `chord` with its modifiers held
    fn press(&self, chord: &KeyChord) -> Result<()>;
}

/// Key input that only records chords in the log
///
/// Used by the binary when no platform key synthesizer is wired in, and
/// handy for dry runs of a new button mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingKeyInput;

impl KeyInput for LoggingKeyInput {
    fn press(&self, chord: &KeyChord) -> Result<()> {
        tracing::info!(
            "Key chord: {:?} (modifiers: {:?})",
            chord.keys,
            chord.modifiers
        );
        Ok(())
    }
}
