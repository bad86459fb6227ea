//! Action tokens from the button mapping
//!
//! Each configured token is either a host key, a modifier, or one of the
//! composite combos. Resolution is case-insensitive; the composite combos
//! accept both the kebab-case and the legacy upper-case spelling.

use crate::error::BridgeError;
use std::str::FromStr;

/// Keys the key-input collaborator knows how to issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKey {
    MediaNextTrack,
    MediaPrevTrack,
    MediaStop,
    MediaPlayPause,
    LaunchMediaSelect,
    VolumeMute,
    VolumeDown,
    VolumeUp,
    BrowserBack,
    BrowserForward,
    BrowserRefresh,
    BrowserStop,
    BrowserSearch,
    BrowserFavorites,
    BrowserHome,
    F5,
    K,
}

impl HostKey {
    /// Keys addressable by name from the config file
    const NAMED: &'static [(&'static str, HostKey)] = &[
        ("VK_MEDIA_NEXT_TRACK", HostKey::MediaNextTrack),
        ("VK_MEDIA_PREV_TRACK", HostKey::MediaPrevTrack),
        ("VK_MEDIA_STOP", HostKey::MediaStop),
        ("VK_MEDIA_PLAY_PAUSE", HostKey::MediaPlayPause),
        ("VK_LAUNCH_MEDIA_SELECT", HostKey::LaunchMediaSelect),
        ("VK_VOLUME_MUTE", HostKey::VolumeMute),
        ("VK_VOLUME_DOWN", HostKey::VolumeDown),
        ("VK_VOLUME_UP", HostKey::VolumeUp),
        ("VK_BROWSER_BACK", HostKey::BrowserBack),
        ("VK_BROWSER_FORWARD", HostKey::BrowserForward),
        ("VK_BROWSER_REFRESH", HostKey::BrowserRefresh),
        ("VK_BROWSER_STOP", HostKey::BrowserStop),
        ("VK_BROWSER_SEARCH", HostKey::BrowserSearch),
        ("VK_BROWSER_FAVORITES", HostKey::BrowserFavorites),
        ("VK_BROWSER_HOME", HostKey::BrowserHome),
    ];

    /// Look up a key by its config name
    pub fn from_name(name: &str) -> Option<HostKey> {
        Self::NAMED
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, key)| key)
    }
}

/// Modifier flags held while a chord is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub altgr: bool,
    pub super_key: bool,
}

impl Modifiers {
    /// Combine two sets of modifiers
    pub fn union(self, other: Modifiers) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl || other.ctrl,
            shift: self.shift || other.shift,
            alt: self.alt || other.alt,
            altgr: self.altgr || other.altgr,
            super_key: self.super_key || other.super_key,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Modifiers::default()
    }
}

/// A set of keys pressed together under some modifiers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyChord {
    pub keys: Vec<HostKey>,
    pub modifiers: Modifiers,
}

impl KeyChord {
    /// Fold a token into the chord: modifiers accumulate, keys append in order
    pub fn push(&mut self, token: ActionToken) {
        match token {
            ActionToken::Key(key) => self.keys.push(key),
            ActionToken::Modifier(m) => self.modifiers = self.modifiers.union(m),
            ActionToken::ForceRefresh | ActionToken::ToggleMicMute => {
                let combo = token.combo();
                self.keys.extend(combo.keys);
                self.modifiers = self.modifiers.union(combo.modifiers);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// One resolved entry of a button's action list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionToken {
    /// A plain host key
    Key(HostKey),
    /// A modifier applied to the whole chord
    Modifier(Modifiers),
    /// Ctrl+F5
    ForceRefresh,
    /// Super+AltGr+K
    ToggleMicMute,
}

impl ActionToken {
    /// The chord a token expands to on its own
    pub fn combo(&self) -> KeyChord {
        match *self {
            ActionToken::Key(key) => KeyChord {
                keys: vec![key],
                modifiers: Modifiers::default(),
            },
            ActionToken::Modifier(modifiers) => KeyChord {
                keys: Vec::new(),
                modifiers,
            },
            ActionToken::ForceRefresh => KeyChord {
                keys: vec![HostKey::F5],
                modifiers: Modifiers {
                    ctrl: true,
                    ..Default::default()
                },
            },
            ActionToken::ToggleMicMute => KeyChord {
                keys: vec![HostKey::K],
                modifiers: Modifiers {
                    super_key: true,
                    altgr: true,
                    ..Default::default()
                },
            },
        }
    }
}

impl FromStr for ActionToken {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let upper = token.to_ascii_uppercase();

        let modifier = |f: fn(&mut Modifiers)| {
            let mut m = Modifiers::default();
            f(&mut m);
            ActionToken::Modifier(m)
        };

        let resolved = match upper.as_str() {
            "FORCE-REFRESH" | "FORCE_REFRESH" => ActionToken::ForceRefresh,
            "TOGGLE-MIC-MUTE" | "WIN_MIC_MUTE_TOGGLE" => ActionToken::ToggleMicMute,
            "CTRL" => modifier(|m| m.ctrl = true),
            "SHIFT" => modifier(|m| m.shift = true),
            "ALT" => modifier(|m| m.alt = true),
            "ALTGR" => modifier(|m| m.altgr = true),
            "SUPER" => modifier(|m| m.super_key = true),
            _ => HostKey::from_name(token)
                .map(ActionToken::Key)
                .ok_or_else(|| BridgeError::UnknownToken(token.to_string()))?,
        };

        Ok(resolved)
    }
}
