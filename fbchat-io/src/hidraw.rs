//! Raw HID keyboard access through `/dev/hidrawN`.
//!
//! Each `read` on a hidraw node returns exactly one input report, so the
//! monitor thread forwards every successful read as one report and leaves
//! length checking to the decoder.

use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const HIDRAW_CLASS_DIR: &str = "/sys/class/hidraw";
pub const DEVICE_DIR: &str = "/dev";

const HID_INTERFACE_CLASS: &str = "03";
const KEYBOARD_PROTOCOL: &str = "01";

#[derive(Debug, Error)]
pub enum KeyboardError {
    #[error("no HID boot keyboard found under {0}")]
    NotFound(PathBuf),
    #[error("failed to open keyboard {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Events from the keyboard thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardEvent {
    Report(Vec<u8>),
    Disconnected(String),
}

/// Finds the first boot-protocol keyboard among the system's hidraw nodes.
pub fn discover_keyboard() -> Result<PathBuf, KeyboardError> {
    discover_keyboard_in(Path::new(HIDRAW_CLASS_DIR), Path::new(DEVICE_DIR))
}

/// Scans `class_dir` for `hidrawN` entries whose USB interface reports class
/// 03 (HID) and protocol 01 (keyboard), lowest `N` first, and returns the
/// matching node under `dev_dir`.
pub fn discover_keyboard_in(class_dir: &Path, dev_dir: &Path) -> Result<PathBuf, KeyboardError> {
    let not_found = || KeyboardError::NotFound(class_dir.to_path_buf());
    let entries = fs::read_dir(class_dir).map_err(|_| not_found())?;

    let mut nodes: Vec<(u32, String)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| {
            let index: u32 = name.strip_prefix("hidraw")?.parse().ok()?;
            Some((index, name))
        })
        .collect();
    nodes.sort();

    for (_, name) in nodes {
        // `device` links to the HID device; its parent is the USB interface.
        let interface = class_dir.join(&name).join("device").join("..");
        let class = read_attr(&interface.join("bInterfaceClass"));
        let protocol = read_attr(&interface.join("bInterfaceProtocol"));
        debug!(%name, ?class, ?protocol, "hidraw node");
        if class.as_deref() == Some(HID_INTERFACE_CLASS) && protocol.as_deref() == Some(KEYBOARD_PROTOCOL) {
            let path = dev_dir.join(&name);
            info!(path = %path.display(), "keyboard found");
            return Ok(path);
        }
    }
    Err(not_found())
}

fn read_attr(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

/// Reads keyboard reports on a dedicated thread.
pub struct KeyboardMonitor {
    device: String,
}

impl std::fmt::Debug for KeyboardMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboardMonitor").field("device", &self.device).finish()
    }
}

impl KeyboardMonitor {
    /// Opens a hidraw node and starts reading it.
    pub fn open(path: &Path) -> Result<(Self, mpsc::Receiver<KeyboardEvent>), KeyboardError> {
        let file = File::open(path).map_err(|source| KeyboardError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::start(path.display().to_string(), file))
    }

    /// Starts the reader thread on any blocking byte source.
    ///
    /// The thread ends after reporting `Disconnected` (end of stream or a
    /// read error) or once the receiver is dropped.
    pub fn start<R>(device: impl Into<String>, mut reader: R) -> (Self, mpsc::Receiver<KeyboardEvent>)
    where
        R: Read + Send + 'static,
    {
        let device = device.into();
        let (tx, rx) = mpsc::channel(64);
        let name = device.clone();

        std::thread::spawn(move || {
            let mut buf = [0u8; 64];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        warn!(device = %name, "keyboard stream ended");
                        let _ = tx.blocking_send(KeyboardEvent::Disconnected("end of stream".into()));
                        break;
                    }
                    Ok(n) => {
                        if tx.blocking_send(KeyboardEvent::Report(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => {
                        warn!(device = %name, error = %e, "keyboard read failed");
                        let _ = tx.blocking_send(KeyboardEvent::Disconnected(e.to_string()));
                        break;
                    }
                }
            }
            debug!(device = %name, "keyboard thread stopped");
        });

        info!(%device, "keyboard monitor started");
        (Self { device }, rx)
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}
