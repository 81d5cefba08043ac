//! Boot-protocol HID keyboard reports.
//!
//! Layout: modifier bitmask, reserved byte, six keycode slots. Slots hold
//! the keys held at the time of the report, in no particular order; unused
//! slots are zero.

use bitflags::bitflags;
use thiserror::Error;

pub const REPORT_LEN: usize = 8;
pub const MAX_KEYS: usize = 6;

/// HID keyboard usage IDs the terminal cares about.
pub mod usage {
    pub const ERROR_ROLL_OVER: u8 = 0x01;
    /// Usages below this are error states, not keys.
    pub const FIRST_KEY: u8 = 0x04;
    pub const A: u8 = 0x04;
    pub const Z: u8 = 0x1d;
    pub const ONE: u8 = 0x1e;
    pub const ENTER: u8 = 0x28;
    pub const ESCAPE: u8 = 0x29;
    pub const BACKSPACE: u8 = 0x2a;
    pub const TAB: u8 = 0x2b;
    pub const SPACE: u8 = 0x2c;
    pub const SLASH: u8 = 0x38;
    pub const CAPS_LOCK: u8 = 0x39;
    pub const INSERT: u8 = 0x49;
    pub const RIGHT: u8 = 0x4f;
    pub const LEFT: u8 = 0x50;
    pub const DOWN: u8 = 0x51;
    pub const UP: u8 = 0x52;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const LEFT_CTRL = 1 << 0;
        const LEFT_SHIFT = 1 << 1;
        const LEFT_ALT = 1 << 2;
        const LEFT_GUI = 1 << 3;
        const RIGHT_CTRL = 1 << 4;
        const RIGHT_SHIFT = 1 << 5;
        const RIGHT_ALT = 1 << 6;
        const RIGHT_GUI = 1 << 7;
    }
}

impl Modifiers {
    pub fn shift(self) -> bool {
        self.intersects(Self::LEFT_SHIFT | Self::RIGHT_SHIFT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("partial HID report: {0} bytes, expected {len}", len = REPORT_LEN)]
    Partial(usize),
}

/// Fixed-capacity set of held keycodes, in report slot order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySet {
    codes: [u8; MAX_KEYS],
    len: usize,
}

impl KeySet {
    /// Collects the real keys among `slots`, skipping empty and error
    /// usages and duplicates. Anything past six keys is ignored.
    pub fn from_slots(slots: &[u8]) -> Self {
        let mut set = Self::default();
        for &code in slots {
            if code >= usage::FIRST_KEY && !set.contains(code) && set.len < MAX_KEYS {
                set.codes[set.len] = code;
                set.len += 1;
            }
        }
        set
    }

    pub fn contains(&self, code: u8) -> bool {
        self.codes[..self.len].contains(&code)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.codes[..self.len].iter().copied()
    }

    /// Keys in `self` that are not in `other`, keeping slot order.
    pub fn difference(&self, other: &KeySet) -> KeySet {
        let mut fresh = Self::default();
        for code in self.iter().filter(|&code| !other.contains(code)) {
            fresh.codes[fresh.len] = code;
            fresh.len += 1;
        }
        fresh
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HidReport {
    pub modifiers: Modifiers,
    pub reserved: u8,
    pub keycodes: [u8; MAX_KEYS],
}

impl HidReport {
    /// Parses one transfer. Anything but a full 8-byte report is rejected.
    pub fn parse(bytes: &[u8]) -> Result<Self, ReportError> {
        if bytes.len() != REPORT_LEN {
            return Err(ReportError::Partial(bytes.len()));
        }
        let mut keycodes = [0u8; MAX_KEYS];
        keycodes.copy_from_slice(&bytes[2..]);
        Ok(Self {
            modifiers: Modifiers::from_bits_retain(bytes[0]),
            reserved: bytes[1],
            keycodes,
        })
    }

    /// Builds a report holding `keys` (at most six are kept).
    pub fn with_keys(modifiers: Modifiers, keys: &[u8]) -> Self {
        let mut keycodes = [0u8; MAX_KEYS];
        for (slot, &code) in keycodes.iter_mut().zip(keys) {
            *slot = code;
        }
        Self {
            modifiers,
            reserved: 0,
            keycodes,
        }
    }

    pub fn to_bytes(&self) -> [u8; REPORT_LEN] {
        let mut bytes = [0u8; REPORT_LEN];
        bytes[0] = self.modifiers.bits();
        bytes[1] = self.reserved;
        bytes[2..].copy_from_slice(&self.keycodes);
        bytes
    }

    /// The keyboard signals "too many keys" by filling slots with
    /// ErrorRollOver; such a report carries no usable key state.
    pub fn is_phantom(&self) -> bool {
        self.keycodes.contains(&usage::ERROR_ROLL_OVER)
    }

    pub fn keys(&self) -> KeySet {
        KeySet::from_slots(&self.keycodes)
    }
}
