//! Terminal states: record the outcome of a run, or mark an item that
//! could not run as failed.

use crate::error::StoreError;
use crate::events::QueueEvent;
use crate::object::{DownloadObject, ItemStatus, Outcome, QueueEntry, SlimmedSummary, TrackFailure};
use crate::queue::state::QueueState;
use crate::queue::QueueManager;

/// Persist the slimmed summary with its terminal status. Canceled items were
/// already deleted by the canceller and are left alone.
pub(super) fn finalize(manager: &QueueManager, object: &DownloadObject) -> Result<(), StoreError> {
    let uuid = object.uuid();
    if object.is_canceled() {
        tracing::info!(uuid, "download canceled");
        return Ok(());
    }
    let mut st = manager.lock();
    if !st.items.contains_key(uuid) {
        return Ok(());
    }
    let status = object.header().terminal_status();
    let slim = object.slimmed();
    manager.store().save_with_status(uuid, &slim, status)?;
    tracing::info!(
        uuid,
        status = status.as_str(),
        downloaded = slim.outcome.downloaded,
        failed = slim.outcome.failed,
        size = slim.essential.size,
        "download finished"
    );
    st.items
        .insert(uuid.to_string(), QueueEntry::finished(slim, status));
    Ok(())
}

/// Rewrite `uuid` as a failed summary and build the `queueError` to report.
/// `None` when the item is no longer known.
pub(super) fn mark_failed(
    manager: &QueueManager,
    st: &mut QueueState,
    uuid: &str,
    message: String,
    errid: &str,
) -> Result<Option<QueueEvent>, StoreError> {
    let Some(entry) = st.items.get(uuid) else {
        return Ok(None);
    };
    let size = entry.summary.size;
    let slim = SlimmedSummary {
        essential: entry.summary.clone(),
        outcome: Outcome {
            failed: size,
            progress: 100.0,
            errors: vec![TrackFailure::new(message.clone()).with_errid(errid)],
            ..Outcome::default()
        },
    };
    manager
        .store()
        .save_with_status(uuid, &slim, ItemStatus::Failed)?;
    st.items
        .insert(uuid.to_string(), QueueEntry::finished(slim, ItemStatus::Failed));
    Ok(Some(QueueEvent::QueueError {
        link: uuid.to_string(),
        error: message,
        errid: Some(errid.to_string()),
    }))
}

/// `mark_failed` for the running job, taking the lock itself and emitting
/// the event once it is released. Skipped when the job was canceled.
pub(super) fn fail_active(
    manager: &QueueManager,
    uuid: &str,
    message: String,
    errid: &str,
) -> Result<(), StoreError> {
    let event = {
        let mut st = manager.lock();
        let canceled = st
            .active
            .as_ref()
            .map(|job| job.cancel.is_canceled())
            .unwrap_or(false);
        if canceled {
            return Ok(());
        }
        mark_failed(manager, &mut st, uuid, message, errid)?
    };
    if let Some(event) = event {
        tracing::warn!(uuid, "item failed before download");
        manager.emit(event);
    }
    Ok(())
}

/// Mark `uuid` failed in memory only, after the store refused a write for
/// it. The record on disk is left as it was. `None` when the item is no
/// longer known.
pub(super) fn fail_unsaved(st: &mut QueueState, uuid: &str, err: &StoreError) -> Option<QueueEvent> {
    let entry = st.items.get(uuid)?;
    let essential = entry.summary.clone();
    let mut outcome = match &st.active {
        Some(job) if job.uuid == uuid => job.live.latest(),
        _ => entry.outcome.clone().unwrap_or_default(),
    };
    outcome
        .errors
        .push(TrackFailure::new(err.to_string()).with_errid("storeError"));
    outcome.progress = 100.0;
    st.items.insert(
        uuid.to_string(),
        QueueEntry::finished(SlimmedSummary { essential, outcome }, ItemStatus::Failed),
    );
    tracing::error!(uuid, error = %err, "queue store rejected a write, item failed");
    Some(QueueEvent::QueueError {
        link: uuid.to_string(),
        error: err.to_string(),
        errid: Some("storeError".to_string()),
    })
}

/// `fail_unsaved` for the running job. Skipped when the job was canceled.
pub(super) fn fail_active_unsaved(manager: &QueueManager, uuid: &str, err: &StoreError) {
    let event = {
        let mut st = manager.lock();
        let canceled = st
            .active
            .as_ref()
            .map(|job| job.cancel.is_canceled())
            .unwrap_or(false);
        if canceled {
            return;
        }
        fail_unsaved(&mut st, uuid, err)
    };
    if let Some(event) = event {
        manager.emit(event);
    }
}
