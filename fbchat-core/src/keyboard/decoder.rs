//! Keystroke decoder.
//!
//! A boot keyboard reports which keys are *held*, not which were pressed.
//! The decoder keeps the previous report's key set and turns each new
//! report into edge events: a key produces an event only in the report
//! where it first appears. At most one character is typed per report; the
//! first newly held key (slot order) that maps to a character wins.

use super::keymap;
use super::report::{HidReport, KeySet, Modifiers, ReportError, usage};
use crate::region::Direction;
use serde::Deserialize;
use tracing::debug;

/// How the lock keys (caps lock, insert) flip their latch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TogglePolicy {
    /// Flip once when the key goes down.
    #[default]
    Edge,
    /// Flip on every report that contains the key, so a held key keeps
    /// toggling at the report rate.
    PerReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A typed character; `\n` for enter, `\t` for tab.
    Char(u8),
    Arrow(Direction),
    Backspace,
    Escape,
}

/// Decoder state for one report cycle.
///
/// `held` and the momentary flags describe the latest report only; the
/// latches persist; `previous` is the key set used for repeat filtering
/// in the next cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyframeState {
    pub held: KeySet,
    pub previous: KeySet,
    pub modifiers: Modifiers,
    pub caps_lock: bool,
    pub insert: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub backspace: bool,
    pub escape: bool,
}

impl KeyframeState {
    pub fn shift(&self) -> bool {
        self.modifiers.shift()
    }

    pub fn any_arrow(&self) -> bool {
        self.left || self.right || self.up || self.down
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyDecoder {
    state: KeyframeState,
    policy: TogglePolicy,
}

impl KeyDecoder {
    pub fn new(policy: TogglePolicy) -> Self {
        Self {
            state: KeyframeState::default(),
            policy,
        }
    }

    pub fn state(&self) -> &KeyframeState {
        &self.state
    }

    pub fn policy(&self) -> TogglePolicy {
        self.policy
    }

    /// Parses and decodes one raw transfer. A partial report is an error and
    /// leaves the state untouched.
    pub fn decode_bytes(&mut self, bytes: &[u8]) -> Result<Vec<KeyEvent>, ReportError> {
        let report = HidReport::parse(bytes)?;
        Ok(self.decode(&report))
    }

    pub fn decode(&mut self, report: &HidReport) -> Vec<KeyEvent> {
        if report.is_phantom() {
            debug!("rollover report ignored");
            return Vec::new();
        }

        let held = report.keys();
        let fresh = held.difference(&self.state.previous);
        let policy = self.policy;
        let fires = |code: u8| match policy {
            TogglePolicy::Edge => fresh.contains(code),
            TogglePolicy::PerReport => held.contains(code),
        };

        let state = &mut self.state;
        state.held = held;
        state.modifiers = report.modifiers;

        if fires(usage::CAPS_LOCK) {
            state.caps_lock = !state.caps_lock;
            debug!(caps_lock = state.caps_lock, "caps lock toggled");
        }
        if fires(usage::INSERT) {
            state.insert = !state.insert;
            debug!(insert = state.insert, "insert mode toggled");
        }

        state.left = held.contains(usage::LEFT);
        state.right = held.contains(usage::RIGHT);
        state.up = held.contains(usage::UP);
        state.down = held.contains(usage::DOWN);
        state.backspace = held.contains(usage::BACKSPACE);
        state.escape = held.contains(usage::ESCAPE);

        let shift = state.shift();
        let mut events = Vec::new();
        let mut typed = false;
        for code in fresh.iter() {
            let event = match code {
                usage::LEFT => Some(KeyEvent::Arrow(Direction::Left)),
                usage::RIGHT => Some(KeyEvent::Arrow(Direction::Right)),
                usage::UP => Some(KeyEvent::Arrow(Direction::Up)),
                usage::DOWN => Some(KeyEvent::Arrow(Direction::Down)),
                usage::BACKSPACE => Some(KeyEvent::Backspace),
                usage::ESCAPE => Some(KeyEvent::Escape),
                _ if typed => None,
                _ => keymap::to_ascii(code, shift, state.caps_lock).map(KeyEvent::Char),
            };
            if let Some(event) = event {
                typed |= matches!(event, KeyEvent::Char(_));
                events.push(event);
            }
        }

        state.previous = held;
        events
    }
}
