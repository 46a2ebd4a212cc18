//! Point-in-time view of the queue for callers and front ends.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::object::{ItemStatus, QueueEntry, SlimmedSummary};

use super::state::QueueState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    /// Every known item, keyed by id.
    pub queue: BTreeMap<String, QueueEntry>,
    /// Ids still waiting to run, front first.
    pub queue_order: Vec<String>,
    /// The running job with the counters it last published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<SlimmedSummary>,
}

impl QueueSnapshot {
    pub(crate) fn capture(state: &QueueState) -> Self {
        Self {
            queue: state
                .items
                .iter()
                .map(|(id, entry)| (id.clone(), entry.clone()))
                .collect(),
            queue_order: state.order.iter().cloned().collect(),
            current: state.active.as_ref().map(|job| job.summary()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.queue.values().filter(|e| e.status == status).count()
    }

    /// Entries in display order: running, then pending in queue order, then
    /// the rest by id.
    pub fn ordered_entries(&self) -> Vec<&QueueEntry> {
        let mut out: Vec<&QueueEntry> = Vec::with_capacity(self.queue.len());
        let current = self.current.as_ref().map(|c| c.essential.uuid.as_str());
        if let Some(entry) = current.and_then(|id| self.queue.get(id)) {
            out.push(entry);
        }
        for id in &self.queue_order {
            if let Some(entry) = self.queue.get(id) {
                if Some(id.as_str()) != current {
                    out.push(entry);
                }
            }
        }
        for (id, entry) in &self.queue {
            if Some(id.as_str()) != current && !self.queue_order.contains(id) {
                out.push(entry);
            }
        }
        out
    }
}
