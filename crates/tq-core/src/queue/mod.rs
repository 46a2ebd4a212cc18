//! Queue manager: the in-memory order and item map, mirrored to the store.
//!
//! All state sits behind one mutex that is never held across an `.await`.
//! Store writes mirroring a mutation happen while it is held, so concurrent
//! producers serialize their appends and the on-disk order always matches a
//! state some caller observed.

mod snapshot;
pub(crate) mod state;


pub use snapshot::QueueSnapshot;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::StoreError;
use crate::events::{Listener, QueueEvent};
use crate::object::{DownloadObject, EssentialSummary, ItemStatus, QueueEntry, SlimmedSummary};
use crate::recovery;
use crate::store::QueueStore;

use state::QueueState;

pub struct QueueManager {
    store: QueueStore,
    state: Mutex<QueueState>,
    listener: Arc<dyn Listener>,
}

impl QueueManager {
    /// Rebuild the queue from `store` and take ownership of it.
    pub fn open(store: QueueStore, listener: Arc<dyn Listener>) -> Result<Self, StoreError> {
        let restored = recovery::restore(&store)?;
        tracing::info!(
            dir = %store.dir().display(),
            items = restored.items.len(),
            pending = restored.order.len(),
            "queue restored"
        );
        Ok(Self {
            store,
            state: Mutex::new(QueueState::new(restored.order, restored.items)),
            listener,
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, QueueState> {
        // State stays consistent at every await-free step, so a panic while
        // holding the lock leaves nothing half-applied worth refusing.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn listener(&self) -> &dyn Listener {
        self.listener.as_ref()
    }

    pub(crate) fn emit(&self, event: QueueEvent) {
        event.emit(self.listener.as_ref());
    }

    /// Add built descriptors to the queue.
    ///
    /// A known id is skipped with `alreadyInQueue` unless `retry` is set. The
    /// running job is never replaced, even on retry. One `addedToQueue` event
    /// covers everything that was added. On a store error the items admitted
    /// so far stay queued and are still announced.
    pub fn admit(
        &self,
        objects: Vec<DownloadObject>,
        retry: bool,
    ) -> Result<Vec<SlimmedSummary>, StoreError> {
        let mut added = Vec::new();
        let mut duplicates: Vec<EssentialSummary> = Vec::new();
        let mut result = Ok(());
        {
            let mut st = self.lock();
            for object in objects {
                let uuid = object.uuid();
                if st.items.contains_key(uuid) && (!retry || st.is_active(uuid)) {
                    duplicates.push(object.essential());
                    continue;
                }
                if let Err(e) = self.persist_queued(&mut st, &object) {
                    result = Err(e);
                    break;
                }
                added.push(object.slimmed());
            }
        }

        for summary in duplicates {
            tracing::debug!(uuid = %summary.uuid, "already in queue");
            self.emit(QueueEvent::AlreadyInQueue(summary));
        }
        if !added.is_empty() || result.is_ok() {
            self.emit(QueueEvent::AddedToQueue(added.clone()));
        }
        result.map(|()| added)
    }

    fn persist_queued(&self, st: &mut QueueState, object: &DownloadObject) -> Result<(), StoreError> {
        let uuid = object.uuid();
        let pushed = !st.order.iter().any(|id| id == uuid);
        if pushed {
            st.order.push_back(uuid.to_string());
        }
        if let Err(e) = self.store.save_order(&st.order) {
            if pushed {
                st.order.pop_back();
            }
            return Err(e);
        }
        if let Err(e) = self.store.save_with_status(uuid, object, ItemStatus::InQueue) {
            if pushed {
                st.order.pop_back();
                if let Err(e2) = self.store.save_order(&st.order) {
                    tracing::warn!(uuid, error = %e2, "could not roll back queue order");
                }
            }
            return Err(e);
        }
        st.items
            .insert(uuid.to_string(), QueueEntry::queued(object.essential()));
        tracing::info!(uuid, "queued");
        Ok(())
    }

    /// Cancel one item. Unknown ids are ignored.
    pub fn cancel_one(&self, uuid: &str) -> Result<(), StoreError> {
        let event = {
            let mut st = self.lock();
            let Some(status) = st.status_of(uuid) else {
                return Ok(());
            };
            // A `downloading` entry with no live job is a crash leftover and
            // is removed like a finished one.
            let event = match status {
                ItemStatus::Downloading if st.is_active(uuid) => {
                    st.cancel_active();
                    QueueEvent::CancellingCurrentItem {
                        uuid: uuid.to_string(),
                    }
                }
                ItemStatus::InQueue => {
                    if st.unqueue(uuid) {
                        self.store.save_order(&st.order)?;
                    }
                    QueueEvent::RemovedFromQueue {
                        uuid: uuid.to_string(),
                    }
                }
                _ => QueueEvent::RemovedFromQueue {
                    uuid: uuid.to_string(),
                },
            };
            self.store.delete(uuid)?;
            st.items.remove(uuid);
            event
        };
        tracing::info!(uuid, "canceled");
        self.emit(event);
        Ok(())
    }

    /// Empty the queue, flag the running job and delete every record.
    ///
    /// Every record is attempted even if one delete fails; the first error
    /// is returned after the order has been persisted.
    pub fn cancel_all(&self) -> Result<(), StoreError> {
        let mut events = Vec::new();
        let mut first_err = None;
        let current = {
            let mut st = self.lock();
            st.order.clear();
            let current = st.cancel_active();
            if let Some(uuid) = &current {
                events.push(QueueEvent::CancellingCurrentItem { uuid: uuid.clone() });
            }
            let ids: Vec<String> = st.items.keys().cloned().collect();
            for id in ids {
                match self.store.delete(&id) {
                    Ok(()) => {
                        st.items.remove(&id);
                    }
                    Err(e) => {
                        tracing::warn!(uuid = %id, error = %e, "could not delete queue record");
                        first_err.get_or_insert(e);
                    }
                }
            }
            if let Err(e) = self.store.save_order(&st.order) {
                first_err.get_or_insert(e);
            }
            current
        };
        for event in events {
            self.emit(event);
        }
        tracing::info!("queue cleared");
        self.emit(QueueEvent::RemovedAllDownloads { current });
        first_err.map_or(Ok(()), Err)
    }

    /// Drop every `completed` item. Failed and partial items stay visible.
    pub fn cleanup_completed(&self) -> Result<usize, StoreError> {
        let removed = {
            let mut st = self.lock();
            let done: Vec<String> = st
                .items
                .iter()
                .filter(|(_, e)| e.status == ItemStatus::Completed)
                .map(|(id, _)| id.clone())
                .collect();
            for id in &done {
                self.store.delete(id)?;
                st.items.remove(id);
            }
            done.len()
        };
        tracing::debug!(removed, "removed finished downloads");
        self.emit(QueueEvent::RemovedFinishedDownloads);
        Ok(removed)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot::capture(&self.lock())
    }

    /// Whether the order holds anything the scheduler could pick up.
    pub fn has_pending(&self) -> bool {
        !self.lock().order.is_empty()
    }
}
