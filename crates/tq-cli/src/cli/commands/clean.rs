//! `tq clean` – drop completed items.

use anyhow::Result;
use std::path::Path;

use super::open_queue;

pub fn run_clean(queue_dir: &Path) -> Result<()> {
    let removed = open_queue(queue_dir)?.cleanup_completed()?;
    println!("Removed {removed} completed item(s)");
    Ok(())
}
