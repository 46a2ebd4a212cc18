//! Turning a claimed descriptor into something the downloader can run.

use crate::engine::Collaborators;
use crate::error::{QueueError, ResolveError, StoreError};
use crate::object::{DownloadObject, ItemStatus};
use crate::queue::QueueManager;
use crate::resolver::Client;

use super::finish;

/// Singles and collections pass through. A convertable goes to the plugin
/// that produced it; the result keeps the queued id and the job's handles and is
/// persisted in place. `Ok(None)` means the item failed and was recorded.
pub(super) async fn materialize<C: Client>(
    manager: &QueueManager,
    collab: &Collaborators<C>,
    client: &C,
    object: DownloadObject,
) -> Result<Option<DownloadObject>, StoreError> {
    let conv = match object {
        DownloadObject::Single(_) | DownloadObject::Collection(_) => return Ok(Some(object)),
        DownloadObject::Convertable(conv) => conv,
    };

    let uuid = conv.header.uuid().to_string();
    let cancel = conv.header.cancel.clone();
    let live = conv.header.live.clone();
    let converted = match collab.plugins.get(&conv.plugin) {
        None => Err(QueueError::UnknownPlugin {
            name: conv.plugin.clone(),
        }),
        Some(plugin) => {
            tracing::debug!(uuid = %uuid, plugin = plugin.name(), "converting item");
            match plugin.convert(client, conv).await {
                Ok(DownloadObject::Convertable(_)) => Err(ResolveError::new(
                    "plugin returned an item that still needs conversion",
                )
                .with_errid("conversionFailed")
                .into()),
                Ok(other) => Ok(other),
                Err(e) => Err(e.into()),
            }
        }
    };

    let mut object = match converted {
        Ok(object) => object,
        Err(e) => {
            let errid = e.errid().unwrap_or("conversionFailed").to_string();
            finish::fail_active(manager, &uuid, e.to_string(), &errid)?;
            return Ok(None);
        }
    };

    let header = object.header_mut();
    header.essential.uuid = uuid.clone();
    header.cancel = cancel;
    header.live = live;
    store_converted(manager, &uuid, &object)?;
    Ok(Some(object))
}

fn store_converted(manager: &QueueManager, uuid: &str, object: &DownloadObject) -> Result<(), StoreError> {
    let mut st = manager.lock();
    if object.is_canceled() || !st.items.contains_key(uuid) {
        return Ok(());
    }
    manager
        .store()
        .save_with_status(uuid, object, ItemStatus::Downloading)?;
    if let Some(job) = st.active.as_mut() {
        object.header().publish_progress();
        job.essential = object.essential();
    }
    if let Some(entry) = st.items.get_mut(uuid) {
        entry.summary = object.essential();
    }
    Ok(())
}
