//! # fbchat core
//!
//! The text-surface engine of the framebuffer chat terminal: glyph
//! rasterization, two independently scrolling text regions on one pixel
//! surface, and the HID keystroke decoder. No device or socket I/O lives
//! here; the bridge feeds events in and carries messages out.

pub mod glyph;
pub mod keyboard;
pub mod layout;
pub mod region;
pub mod scroll;
pub mod surface;
pub mod terminal;

// Re-export the main struct so users can just use `fbchat_core::Terminal`
pub use terminal::{Reaction, Terminal, TerminalOptions};

pub use glyph::{Font, FontError};
pub use keyboard::{HidReport, KeyDecoder, KeyEvent, TogglePolicy};
pub use layout::{Layout, LayoutError};
pub use region::{CellPos, Direction, RegionBounds, RegionKind, TextRegion};
pub use surface::{PixelSurface, SurfaceError, SurfaceGeometry};

/// Everything the terminal reacts to, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermEvent {
    Report(Vec<u8>),      // Raw keyboard transfer
    Inbound(Vec<u8>),     // Bytes from the chat server
    BlinkTick,            // Cursor blink timer fired
    KeyboardLost(String), // Keyboard read failed; ends the session
    NetworkClosed,        // Server hung up
}
