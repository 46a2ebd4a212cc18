//! `tq status` – list every item, running one first.

use anyhow::Result;
use std::path::Path;
use tq_core::{ItemStatus, QueueSnapshot};

use super::open_queue;

pub fn run_status(queue_dir: &Path, json: bool) -> Result<()> {
    let snapshot = open_queue(queue_dir)?.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }
    print!("{}", render_table(&snapshot));
    Ok(())
}

pub(crate) fn render_table(snapshot: &QueueSnapshot) -> String {
    if snapshot.is_empty() {
        return "Queue is empty.\n".to_string();
    }
    let mut out = format!(
        "{:<28} {:<11} {:<9} {}\n",
        "ID", "STATUS", "DONE", "TITLE"
    );
    for entry in snapshot.ordered_entries() {
        let done = match &entry.outcome {
            Some(o) => format!("{}/{}", o.downloaded, entry.summary.size),
            None => format!("-/{}", entry.summary.size),
        };
        let title = if entry.summary.artist.is_empty() {
            entry.summary.title.clone()
        } else {
            format!("{} - {}", entry.summary.artist, entry.summary.title)
        };
        out.push_str(&format!(
            "{:<28} {:<11} {:<9} {}\n",
            entry.uuid(),
            entry.status.as_str(),
            done,
            title
        ));
    }
    let pending = snapshot.count(ItemStatus::InQueue);
    let failed = snapshot.count(ItemStatus::Failed) + snapshot.count(ItemStatus::WithErrors);
    out.push_str(&format!("{} queued, {} with failures\n", pending, failed));
    out
}
