//! # fbchat bridge
//!
//! Start-up and wiring: configuration, devices, the chat server connection
//! and the session loop.

pub mod config;
pub mod network;
pub mod session;

pub use config::Config;
pub use session::Session;

use anyhow::{Context, Result};
use fbchat_core::{Font, Layout, Terminal};
use fbchat_io::{Framebuffer, KeyboardMonitor, discover_keyboard};
use tracing::info;

/// Loads the configured font, or the built-in one.
pub fn load_font(config: &Config) -> Result<Font> {
    match &config.font {
        Some(path) => {
            let bytes = std::fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
            let font = Font::from_psf(&bytes).with_context(|| format!("invalid font {}", path.display()))?;
            info!(path = %path.display(), "font loaded");
            Ok(font)
        }
        None => Ok(Font::builtin()),
    }
}

/// Opens every device, connects to the server and runs the session until
/// the user quits.
pub async fn run(config: Config) -> Result<()> {
    let font = load_font(&config)?;

    let surface = Framebuffer::open(&config.framebuffer)?
        .into_surface()
        .context("failed to map framebuffer")?;
    let layout = Layout::fit(surface.geometry(), config.rows, config.cols)
        .context("text grid does not fit the display")?;
    let mut terminal = Terminal::new(surface, font, layout, config.terminal_options())?;
    terminal.draw_chrome().context("failed to draw the screen")?;

    let keyboard_path = match &config.keyboard {
        Some(path) => path.clone(),
        None => discover_keyboard()?,
    };
    let (_keyboard, keyboard_rx) = KeyboardMonitor::open(&keyboard_path)?;

    let stream = network::connect(&config.server_addr()).await?;

    Session::new(terminal, config.blink_interval(), config.recv_size)
        .run(stream, keyboard_rx)
        .await?;
    Ok(())
}
