//! Queue engine: the public entry point tying the queue manager to the
//! factory and the background scheduler.
//!
//! One `QueueEngine` owns one queue directory. Clones share the same state.

use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::QueueConfig;
use crate::downloader::Downloader;
use crate::error::{QueueError, StoreError};
use crate::events::{Listener, QueueEvent};
use crate::factory;
use crate::object::{Bitrate, SlimmedSummary};
use crate::queue::{QueueManager, QueueSnapshot};
use crate::resolver::{Client, PluginRegistry, Resolver};
use crate::scheduler;
use crate::store::QueueStore;

/// External services the engine delegates to.
pub struct Collaborators<C: Client> {
    pub resolver: Arc<dyn Resolver<C>>,
    pub plugins: PluginRegistry<C>,
    pub downloader: Arc<dyn Downloader<C>>,
}

#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    /// Queue bitrates the account cannot stream instead of refusing them.
    pub feeling_lucky: bool,
    /// Bitrate for `enqueue_default`.
    pub default_bitrate: Bitrate,
}

impl From<&QueueConfig> for EngineSettings {
    fn from(cfg: &QueueConfig) -> Self {
        Self {
            feeling_lucky: cfg.feeling_lucky,
            default_bitrate: cfg.default_bitrate,
        }
    }
}

struct EngineInner<C: Client> {
    manager: QueueManager,
    collab: Collaborators<C>,
    settings: EngineSettings,
    /// True while a drain task is running.
    draining: watch::Sender<bool>,
}

pub struct QueueEngine<C: Client> {
    inner: Arc<EngineInner<C>>,
}

impl<C: Client> Clone for QueueEngine<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Client> QueueEngine<C> {
    /// Recover the queue in `store` and build an engine around it. Nothing
    /// runs until `enqueue` or `start_queue` is called.
    pub fn open(
        store: QueueStore,
        collab: Collaborators<C>,
        settings: EngineSettings,
        listener: Arc<dyn Listener>,
    ) -> Result<Self, StoreError> {
        let manager = QueueManager::open(store, listener)?;
        let (draining, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(EngineInner {
                manager,
                collab,
                settings,
                draining,
            }),
        })
    }

    pub fn manager(&self) -> &QueueManager {
        &self.inner.manager
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    /// Resolve `links` and queue the results, then make sure the scheduler
    /// is running. Never waits for downloads.
    ///
    /// Login and bitrate entitlement are checked before anything else and
    /// returned as errors. Links that fail to resolve are reported through
    /// `queueError` events and do not stop the rest of the batch.
    pub async fn enqueue<S: AsRef<str>>(
        &self,
        client: Arc<C>,
        links: &[S],
        bitrate: Bitrate,
        retry: bool,
    ) -> Result<Vec<SlimmedSummary>, QueueError> {
        self.check_preconditions(client.as_ref(), bitrate)?;
        if links.is_empty() {
            return Ok(Vec::new());
        }
        let manager = &self.inner.manager;
        let collab = &self.inner.collab;

        let batch = (links.len() > 1).then(|| Uuid::new_v4().to_string());
        if let Some(uuid) = &batch {
            manager.emit(QueueEvent::StartGeneratingItems {
                uuid: uuid.clone(),
                total: links.len(),
            });
        }

        let mut objects = Vec::new();
        let mut failures = Vec::new();
        for link in links {
            let link = link.as_ref();
            tracing::info!(link, bitrate = %bitrate, "adding link to queue");
            match factory::build(
                client.as_ref(),
                link,
                bitrate,
                collab.resolver.as_ref(),
                &collab.plugins,
            )
            .await
            {
                Ok(built) => objects.extend(built),
                Err(e) => failures.push((link.to_string(), e)),
            }
        }

        for (link, e) in failures {
            if e.errid().is_none() {
                tracing::error!(link = %link, error = %e, "link failed without an error id");
            } else {
                tracing::warn!(link = %link, error = %e, "link failed");
            }
            manager.emit(QueueEvent::QueueError {
                link: e.link().unwrap_or(&link).to_string(),
                error: e.to_string(),
                errid: e.errid().map(str::to_string),
            });
        }

        if let Some(uuid) = batch {
            manager.emit(QueueEvent::FinishGeneratingItems {
                uuid,
                total: objects.len(),
            });
        }

        let added = manager.admit(objects, retry);
        self.start_queue(client);
        Ok(added?)
    }

    /// `enqueue` at the configured default bitrate.
    pub async fn enqueue_default<S: AsRef<str>>(
        &self,
        client: Arc<C>,
        links: &[S],
        retry: bool,
    ) -> Result<Vec<SlimmedSummary>, QueueError> {
        let bitrate = self.inner.settings.default_bitrate;
        self.enqueue(client, links, bitrate, retry).await
    }

    fn check_preconditions(&self, client: &C, bitrate: Bitrate) -> Result<(), QueueError> {
        if !client.is_logged_in() {
            return Err(QueueError::NotLoggedIn);
        }
        let cant_stream = (bitrate.is_lossless() && !client.can_stream_lossless())
            || (bitrate.is_high_quality() && !client.can_stream_hq());
        if cant_stream && !self.inner.settings.feeling_lucky {
            return Err(QueueError::CantStream(bitrate));
        }
        Ok(())
    }

    /// Spawn the drain task unless one is already running. Returns whether
    /// this call started it.
    pub fn start_queue(&self, client: Arc<C>) -> bool {
        let started = self.inner.draining.send_if_modified(|running| {
            if *running {
                false
            } else {
                *running = true;
                true
            }
        });
        if started {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(inner.supervise(client));
        }
        started
    }

    /// Resolves once no drain task is running.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.draining.subscribe();
        let _ = rx.wait_for(|running| !*running).await;
    }

    pub fn is_draining(&self) -> bool {
        *self.inner.draining.borrow()
    }

    pub fn cancel_one(&self, uuid: &str) -> Result<(), StoreError> {
        self.inner.manager.cancel_one(uuid)
    }

    pub fn cancel_all(&self) -> Result<(), StoreError> {
        self.inner.manager.cancel_all()
    }

    pub fn cleanup_completed(&self) -> Result<usize, StoreError> {
        self.inner.manager.cleanup_completed()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.inner.manager.snapshot()
    }
}

impl<C: Client> EngineInner<C> {
    /// Run the drain in its own task and start a fresh one if it dies, so a
    /// collaborator that panics costs one item and not the queue.
    async fn supervise(self: Arc<Self>, client: Arc<C>) {
        loop {
            let worker = tokio::spawn(Arc::clone(&self).drain_until_empty(Arc::clone(&client)));
            match worker.await {
                Ok(()) => return,
                Err(e) if e.is_panic() => {
                    tracing::error!("queue worker panicked, failing its item and restarting");
                    scheduler::recover_abandoned_job(&self.manager, "download worker panicked");
                }
                Err(e) => {
                    // Runtime shutdown: leave the item as a crash would.
                    tracing::warn!(error = %e, "queue worker stopped");
                    self.draining.send_replace(false);
                    return;
                }
            }
        }
    }

    async fn drain_until_empty(self: Arc<Self>, client: Arc<C>) {
        loop {
            let ran = scheduler::drain(&self.manager, &self.collab, client.as_ref()).await;
            tracing::debug!(ran, "queue drained");
            // The flag only drops while the order is seen empty, so an
            // enqueue that found it set is always picked up here.
            let finished = self.draining.send_if_modified(|running| {
                if self.manager.has_pending() {
                    false
                } else {
                    *running = false;
                    true
                }
            });
            if finished {
                return;
            }
        }
    }
}
