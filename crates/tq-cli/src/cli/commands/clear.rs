//! `tq clear` – remove every item.

use anyhow::Result;
use std::path::Path;

use super::open_queue;

pub fn run_clear(queue_dir: &Path) -> Result<()> {
    let manager = open_queue(queue_dir)?;
    let count = manager.snapshot().queue.len();
    manager.cancel_all()?;
    println!("Removed {count} item(s)");
    Ok(())
}
