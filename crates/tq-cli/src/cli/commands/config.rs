//! `tq config` – show where the config lives and what is in effect.

use anyhow::Result;
use std::path::Path;
use tq_core::config::{self, QueueConfig};

pub fn run_config(cfg: &QueueConfig, queue_dir: &Path) -> Result<()> {
    println!("config file:     {}", config::config_path()?.display());
    println!("queue dir:       {}", queue_dir.display());
    println!("default bitrate: {}", cfg.default_bitrate);
    println!("feeling lucky:   {}", cfg.feeling_lucky);
    println!(
        "log filter:      {}",
        cfg.log_filter.as_deref().unwrap_or("(default)")
    );
    Ok(())
}
