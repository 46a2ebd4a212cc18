//! Claiming the next queued item and releasing the job slot.

use crate::control::{CancelToken, ProgressHandle};
use crate::error::StoreError;
use crate::events::QueueEvent;
use crate::object::{DownloadObject, ItemStatus};
use crate::queue::state::{ActiveJob, QueueState};
use crate::queue::QueueManager;

use super::finish;

pub(super) struct ClaimedJob {
    pub uuid: String,
    pub object: DownloadObject,
}

pub(super) enum Claim {
    /// Nothing to run, or another job holds the slot.
    Idle,
    /// The front item could not be claimed and was marked failed.
    Skipped(QueueEvent),
    Job(ClaimedJob),
}

/// Pop the next runnable id, mark it `downloading` on disk and in memory,
/// and take the job slot. The shrunk order is persisted before returning,
/// so a crash from here on leaves a `downloading` record outside the order.
///
/// An item the store cannot load or rewrite ends `failed` and is handed
/// back as `Skipped`; the queue behind it keeps going.
pub(super) fn claim_next(manager: &QueueManager) -> Claim {
    let store = manager.store();
    let mut st = manager.lock();
    if st.active.is_some() || st.order.is_empty() {
        return Claim::Idle;
    }

    let Some(uuid) = pop_runnable(&mut st) else {
        save_order_or_warn(manager, &st);
        return Claim::Idle;
    };

    let loaded = match store.load::<DownloadObject>(&uuid) {
        Ok(Some(object)) => Ok(object),
        Ok(None) => Err("queue record is missing".to_string()),
        Err(StoreError::Parse { source, .. }) => Err(format!("queue record is unreadable: {}", source)),
        Err(e) => {
            let event = finish::fail_unsaved(&mut st, &uuid, &e);
            return skip(manager, &mut st, &uuid, event);
        }
    };
    let mut object = match loaded {
        Ok(object) => object,
        Err(message) => {
            tracing::warn!(uuid = %uuid, %message, "skipping queue item");
            let event = match finish::mark_failed(manager, &mut st, &uuid, message, "invalidRecord") {
                Ok(event) => event,
                Err(e) => finish::fail_unsaved(&mut st, &uuid, &e),
            };
            return skip(manager, &mut st, &uuid, event);
        }
    };

    let header = object.header_mut();
    header.cancel = CancelToken::new();
    header.live = ProgressHandle::new();
    st.set_status(&uuid, ItemStatus::Downloading);
    let persisted = store
        .save_with_status(&uuid, &object, ItemStatus::Downloading)
        .and_then(|()| store.save_order(&st.order));
    if let Err(e) = persisted {
        let event = finish::fail_unsaved(&mut st, &uuid, &e);
        return skip(manager, &mut st, &uuid, event);
    }

    st.active = Some(ActiveJob::for_object(&object));
    Claim::Job(ClaimedJob { uuid, object })
}

fn skip(manager: &QueueManager, st: &mut QueueState, uuid: &str, event: Option<QueueEvent>) -> Claim {
    tracing::debug!(uuid, "queue item skipped");
    save_order_or_warn(manager, st);
    match event {
        Some(event) => Claim::Skipped(event),
        None => Claim::Idle,
    }
}

/// Front id whose entry is still waiting. Stale ids are dropped.
fn pop_runnable(st: &mut QueueState) -> Option<String> {
    while let Some(id) = st.order.pop_front() {
        if st.status_of(&id) == Some(ItemStatus::InQueue) {
            return Some(id);
        }
        tracing::debug!(uuid = %id, "dropping stale id from queue order");
    }
    None
}

/// The in-memory order stays authoritative; the next successful save
/// catches the file up.
fn save_order_or_warn(manager: &QueueManager, st: &QueueState) {
    if let Err(e) = manager.store().save_order(&st.order) {
        tracing::warn!(error = %e, "could not persist queue order");
    }
}

/// Free the job slot and persist the order.
pub(super) fn release(manager: &QueueManager) {
    let mut st = manager.lock();
    st.active = None;
    save_order_or_warn(manager, &st);
}
