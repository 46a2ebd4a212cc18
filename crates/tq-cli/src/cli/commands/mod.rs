//! CLI command handlers. Each command is in its own file.

mod cancel;
mod clean;
mod clear;
mod config;
mod parse;
mod status;

pub use cancel::run_cancel;
pub use clean::run_clean;
pub use clear::run_clear;
pub use config::run_config;
pub use parse::run_parse;
pub use status::run_status;

#[cfg(test)]
pub(crate) use parse::describe;
#[cfg(test)]
pub(crate) use status::render_table;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tq_core::events::TracingListener;
use tq_core::{QueueManager, QueueStore};

/// Recover the queue at `dir`. Events from the commands go to the log.
pub(crate) fn open_queue(dir: &Path) -> Result<QueueManager> {
    let store = QueueStore::open(dir)
        .with_context(|| format!("failed to open queue directory: {}", dir.display()))?;
    let manager = QueueManager::open(store, Arc::new(TracingListener))
        .with_context(|| format!("failed to load queue: {}", dir.display()))?;
    Ok(manager)
}
