//! Startup recovery: rebuild the queue state from the store.
//!
//! Unreadable records and records from incompatible resolver versions are
//! deleted and logged. `downloading` records left by a crash are registered
//! as they are and never re-queued on their own.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{RecordError, StoreError};
use crate::object::{DownloadObject, ItemStatus, QueueEntry, SlimmedSummary};
use crate::store::QueueStore;

/// What recovery hands to the queue manager.
#[derive(Debug, Default)]
pub struct Restored {
    pub order: VecDeque<String>,
    pub items: HashMap<String, QueueEntry>,
}

#[derive(Deserialize)]
struct StatusFields {
    status: ItemStatus,
    #[serde(rename = "__type__", default)]
    kind: Option<String>,
}

pub fn restore(store: &QueueStore) -> Result<Restored, StoreError> {
    let swept = store.sweep_temp_files()?;
    if swept > 0 {
        tracing::debug!(swept, "removed interrupted queue writes");
    }
    let stored_order = store.load_order()?;

    let mut items = HashMap::new();
    for id in store.entries()? {
        let raw = match store.load_raw(&id) {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(StoreError::Parse { source, .. }) => {
                discard(store, &id, &RecordError::Unparseable(source))?;
                continue;
            }
            Err(e) => return Err(e),
        };
        match decode_record(raw) {
            Ok(entry) => {
                items.insert(id, entry);
            }
            Err(e) => discard(store, &id, &e)?,
        }
    }

    // Only pending items belong in the order, once each.
    let mut seen: HashSet<String> = HashSet::new();
    let order: VecDeque<String> = stored_order
        .iter()
        .filter(|id| {
            items
                .get(id.as_str())
                .map(|e: &QueueEntry| e.status == ItemStatus::InQueue)
                .unwrap_or(false)
        })
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect();
    if order.len() != stored_order.len() {
        tracing::info!(
            dropped = stored_order.len() - order.len(),
            "queue order had stale ids, rewriting"
        );
        store.save_order(&order)?;
    }

    let orphans = items
        .iter()
        .filter(|(id, e)| e.status == ItemStatus::InQueue && !seen.contains(id.as_str()))
        .count();
    if orphans > 0 {
        tracing::warn!(orphans, "queued records missing from the order; resubmit with retry to run them");
    }

    Ok(Restored { order, items })
}

fn discard(store: &QueueStore, id: &str, reason: &RecordError) -> Result<(), StoreError> {
    tracing::warn!(uuid = %id, reason = %reason, "discarding queue record");
    store.delete(id)
}

/// Turn one stored record into a resident entry.
pub(crate) fn decode_record(raw: Value) -> Result<QueueEntry, RecordError> {
    let fields: StatusFields = serde_json::from_value(raw.clone())?;
    match (fields.status, fields.kind) {
        (ItemStatus::InQueue, _) => {
            let object: DownloadObject = serde_json::from_value(raw)?;
            check_schema(&object)?;
            Ok(QueueEntry::queued(object.essential()))
        }
        (status, Some(_)) => {
            let object: DownloadObject = serde_json::from_value(raw)?;
            let outcome = status
                .is_terminal()
                .then(|| object.header().outcome.clone());
            Ok(QueueEntry {
                summary: object.essential(),
                status,
                outcome,
            })
        }
        (status, None) => {
            let slim: SlimmedSummary = serde_json::from_value(raw)?;
            Ok(QueueEntry::finished(slim, status))
        }
    }
}

/// Records written by the old gateway-based resolver cannot be run.
fn check_schema(object: &DownloadObject) -> Result<(), RecordError> {
    match object {
        DownloadObject::Single(o) if o.single.legacy_track.is_some() => {
            Err(RecordError::SchemaIncompatible)
        }
        DownloadObject::Collection(o) if o.collection.legacy_tracks.is_some() => {
            Err(RecordError::SchemaIncompatible)
        }
        DownloadObject::Single(_) | DownloadObject::Collection(_) | DownloadObject::Convertable(_) => {
            Ok(())
        }
    }
}
