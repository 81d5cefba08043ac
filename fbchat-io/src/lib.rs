//! # fbchat IO
//!
//! The device side of the terminal: the Linux framebuffer mapped as a pixel
//! surface, and the raw HID keyboard read on its own thread.

#[cfg(unix)]
pub mod framebuffer;
pub mod hidraw;

#[cfg(unix)]
pub use framebuffer::{Framebuffer, FramebufferError, FramebufferSurface};
pub use hidraw::{KeyboardError, KeyboardEvent, KeyboardMonitor, discover_keyboard};
