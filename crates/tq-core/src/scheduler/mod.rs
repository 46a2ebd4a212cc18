//! Single-worker scheduler.
//!
//! `drain` pulls ids off the front of the order one at a time: claim (mark
//! `downloading`, persist) → materialize convertables → run the downloader →
//! persist the terminal status → release the slot. Every per-item failure,
//! store errors included, ends as a `failed` status and a `queueError`
//! event; the loop moves on to the next item.

mod claim;
mod finish;
mod materialize;


use crate::engine::Collaborators;
use crate::error::{DownloadError, StoreError};
use crate::events::QueueEvent;
use crate::object::{DownloadObject, TrackFailure};
use crate::queue::QueueManager;
use crate::resolver::Client;

use claim::{Claim, ClaimedJob};

/// Run queued items until the order is empty. Returns how many items were
/// handed to the downloader.
pub async fn drain<C: Client>(manager: &QueueManager, collab: &Collaborators<C>, client: &C) -> usize {
    let mut ran = 0;
    loop {
        match claim::claim_next(manager) {
            Claim::Idle => return ran,
            Claim::Skipped(event) => manager.emit(event),
            Claim::Job(job) => {
                let uuid = job.uuid.clone();
                match run_claimed(manager, collab, client, job).await {
                    Ok(true) => ran += 1,
                    Ok(false) => {}
                    Err(e) => finish::fail_active_unsaved(manager, &uuid, &e),
                }
                claim::release(manager);
            }
        }
    }
}

/// Clean up after a drain task that died mid-job: the running item ends
/// `failed` and the slot is freed so the queue can go on.
pub(crate) fn recover_abandoned_job(manager: &QueueManager, reason: &str) {
    let event = {
        let mut st = manager.lock();
        let Some(job) = st.active.clone() else {
            return;
        };
        let event = if job.cancel.is_canceled() {
            None
        } else {
            match finish::mark_failed(manager, &mut st, &job.uuid, reason.to_string(), "workerCrashed") {
                Ok(event) => event,
                Err(e) => finish::fail_unsaved(&mut st, &job.uuid, &e),
            }
        };
        st.active = None;
        if let Err(e) = manager.store().save_order(&st.order) {
            tracing::warn!(error = %e, "could not persist queue order");
        }
        event
    };
    if let Some(event) = event {
        manager.emit(event);
    }
}

/// Returns whether the downloader ran.
async fn run_claimed<C: Client>(
    manager: &QueueManager,
    collab: &Collaborators<C>,
    client: &C,
    job: ClaimedJob,
) -> Result<bool, StoreError> {
    let ClaimedJob { uuid, object } = job;
    let Some(mut object) = materialize::materialize(manager, collab, client, object).await? else {
        return Ok(false);
    };

    tracing::info!(uuid = %uuid, kind = ?object.kind(), size = object.header().size(), "download started");
    manager.emit(QueueEvent::StartDownload { uuid: uuid.clone() });
    if let Err(e) = collab
        .downloader
        .run(client, &mut object, manager.listener())
        .await
    {
        record_download_error(&mut object, e);
    }

    finish::finalize(manager, &object)?;
    Ok(true)
}

/// Count every track the downloader did not get to as failed.
fn record_download_error(object: &mut DownloadObject, err: DownloadError) {
    if matches!(err, DownloadError::Canceled) && object.is_canceled() {
        return;
    }
    let uuid = object.uuid().to_string();
    tracing::warn!(uuid = %uuid, error = %err, "downloader gave up on item");
    let header = object.header_mut();
    if header.essential.size == 0 {
        header.essential.size = 1;
    }
    let done = header.outcome.downloaded + header.outcome.failed;
    header.outcome.failed += header.essential.size.saturating_sub(done);
    header
        .outcome
        .errors
        .push(TrackFailure::new(err.to_string()).with_errid("downloadFailed"));
    header.outcome.progress = 100.0;
}
