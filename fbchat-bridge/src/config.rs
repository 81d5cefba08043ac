//! Runtime configuration.
//!
//! Built-in defaults, then an optional JSON file, then environment
//! overrides. Every field is optional in the file.

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use fbchat_core::{TerminalOptions, TogglePolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "FBCHAT_CONFIG";
pub const SERVER_ENV: &str = "FBCHAT_SERVER";
pub const FRAMEBUFFER_ENV: &str = "FBCHAT_FB";
pub const KEYBOARD_ENV: &str = "FBCHAT_KEYBOARD";
pub const LOG_ENV: &str = "FBCHAT_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub framebuffer: PathBuf,
    /// hidraw node; discovered when unset
    pub keyboard: Option<PathBuf>,
    /// PSF1 font; the built-in table when unset
    pub font: Option<PathBuf>,
    pub rows: usize,
    pub cols: usize,
    pub message_size: usize,
    pub recv_size: usize,
    pub blink_interval_ms: u64,
    pub toggle_policy: TogglePolicy,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "128.59.19.114".to_string(),
            server_port: 42000,
            framebuffer: PathBuf::from("/dev/fb0"),
            keyboard: None,
            font: None,
            rows: 24,
            cols: 64,
            message_size: 128,
            recv_size: 128,
            blink_interval_ms: 250,
            toggle_policy: TogglePolicy::Edge,
            log_level: "info".to_string(),
        }
    }
}

/// `config.json` in the platform config directory.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "fbchat", "fbchat").map(|dirs| dirs.config_dir().join("config.json"))
}

impl Config {
    /// Loads the process configuration.
    ///
    /// A file named by `FBCHAT_CONFIG` must exist; the default file is
    /// skipped when absent.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Applies the `FBCHAT_*` overrides found through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(server) = lookup(SERVER_ENV) {
            let (host, port) = server
                .rsplit_once(':')
                .with_context(|| format!("{SERVER_ENV} must be host:port, got {server:?}"))?;
            self.server_port = port
                .parse()
                .with_context(|| format!("invalid port in {SERVER_ENV}: {port:?}"))?;
            self.server_host = host.to_string();
        }
        if let Some(path) = lookup(FRAMEBUFFER_ENV) {
            self.framebuffer = PathBuf::from(path);
        }
        if let Some(path) = lookup(KEYBOARD_ENV) {
            self.keyboard = Some(PathBuf::from(path));
        }
        if let Some(level) = lookup(LOG_ENV) {
            self.log_level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.message_size == 0 {
            bail!("message_size must be at least 1");
        }
        if self.recv_size < 2 {
            bail!("recv_size must be at least 2, got {}", self.recv_size);
        }
        if self.blink_interval_ms == 0 {
            bail!("blink_interval_ms must be positive");
        }
        self.log_level()?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.log_level
            .parse()
            .with_context(|| format!("invalid log level {:?}", self.log_level))
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_interval_ms)
    }

    pub fn terminal_options(&self) -> TerminalOptions {
        TerminalOptions {
            message_size: self.message_size,
            toggle_policy: self.toggle_policy,
        }
    }
}
