use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::object::Bitrate;

const APP_PREFIX: &str = "tunequeue";

/// Global configuration loaded from `~/.config/tunequeue/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue directory. Defaults to `~/.local/state/tunequeue/queue`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_dir: Option<PathBuf>,
    /// Queue bitrates the account is not entitled to instead of refusing them.
    pub feeling_lucky: bool,
    /// Bitrate used when a caller does not ask for one.
    pub default_bitrate: Bitrate,
    /// `tracing` filter directive; `RUST_LOG` still wins when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_dir: None,
            feeling_lucky: false,
            default_bitrate: Bitrate::MP3_128,
            log_filter: None,
        }
    }
}

impl QueueConfig {
    /// Effective queue directory.
    pub fn queue_dir(&self) -> Result<PathBuf> {
        match &self.queue_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(state_dir()?.join("queue")),
        }
    }
}

/// `~/.local/state/tunequeue`.
pub fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX)?;
    Ok(xdg_dirs.get_state_home())
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX)?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<QueueConfig> {
    load_or_init_at(&config_path()?)
}

/// `load_or_init` against an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<QueueConfig> {
    if !path.exists() {
        let default_cfg = QueueConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("failed to write default config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let cfg: QueueConfig = toml::from_str(&data)
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
