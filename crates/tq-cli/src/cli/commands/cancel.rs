//! `tq cancel <uuid>` – remove one item from the queue directory.

use anyhow::{bail, Result};
use std::path::Path;

use super::open_queue;

pub fn run_cancel(queue_dir: &Path, uuid: &str) -> Result<()> {
    let manager = open_queue(queue_dir)?;
    if !manager.snapshot().queue.contains_key(uuid) {
        bail!("no item {} in {}", uuid, queue_dir.display());
    }
    manager.cancel_one(uuid)?;
    println!("Removed {uuid}");
    Ok(())
}
