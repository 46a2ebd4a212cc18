//! In-memory queue state guarded by the manager's lock.

use std::collections::{HashMap, VecDeque};

use crate::control::{CancelToken, ProgressHandle};
use crate::object::{DownloadObject, EssentialSummary, ItemStatus, QueueEntry, SlimmedSummary};

/// The job the scheduler is running. The descriptor itself stays with the
/// scheduler; this is what other callers may see or touch.
#[derive(Debug, Clone)]
pub(crate) struct ActiveJob {
    pub uuid: String,
    pub cancel: CancelToken,
    pub essential: EssentialSummary,
    pub live: ProgressHandle,
}

impl ActiveJob {
    /// Slot entry sharing `object`'s cancel flag and progress handle.
    pub fn for_object(object: &DownloadObject) -> Self {
        let header = object.header();
        header.publish_progress();
        Self {
            uuid: header.uuid().to_string(),
            cancel: header.cancel.clone(),
            essential: header.essential.clone(),
            live: header.live.clone(),
        }
    }

    /// Summary with the counters the downloader last published.
    pub fn summary(&self) -> SlimmedSummary {
        SlimmedSummary {
            essential: self.essential.clone(),
            outcome: self.live.latest(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct QueueState {
    /// Ids waiting to run, front first.
    pub order: VecDeque<String>,
    pub items: HashMap<String, QueueEntry>,
    pub active: Option<ActiveJob>,
}

impl QueueState {
    pub fn new(order: VecDeque<String>, items: HashMap<String, QueueEntry>) -> Self {
        Self {
            order,
            items,
            active: None,
        }
    }

    pub fn status_of(&self, uuid: &str) -> Option<ItemStatus> {
        self.items.get(uuid).map(|e| e.status)
    }

    pub fn is_active(&self, uuid: &str) -> bool {
        self.active.as_ref().map(|j| j.uuid == uuid).unwrap_or(false)
    }

    pub fn set_status(&mut self, uuid: &str, status: ItemStatus) {
        if let Some(entry) = self.items.get_mut(uuid) {
            entry.status = status;
        }
    }

    /// Remove `uuid` from the order. Returns whether it was there.
    pub fn unqueue(&mut self, uuid: &str) -> bool {
        let before = self.order.len();
        self.order.retain(|id| id != uuid);
        self.order.len() != before
    }

    /// Flag the active job as canceled. Returns its id.
    pub fn cancel_active(&self) -> Option<String> {
        self.active.as_ref().map(|job| {
            job.cancel.cancel();
            job.uuid.clone()
        })
    }
}
