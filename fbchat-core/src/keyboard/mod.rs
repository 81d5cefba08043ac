//! HID keyboard decoding.
//!
//! - `report`: wire layout of a boot-protocol report and the held-key set
//! - `keymap`: keycode to ASCII
//! - `decoder`: per-report state machine producing key events

pub mod decoder;
pub mod keymap;
pub mod report;

pub use decoder::{KeyDecoder, KeyEvent, KeyframeState, TogglePolicy};
pub use report::{HidReport, KeySet, MAX_KEYS, Modifiers, REPORT_LEN, ReportError, usage};
