//! Scripted collaborators for engine integration tests.
//!
//! `ScriptedResolver` answers by exact link, `ConvertingPlugin` plays the
//! secondary catalog, and `ScriptedDownloader` fakes track outcomes and can
//! hold chosen items mid-run until the test releases them.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::{Notify, Semaphore};

use tq_core::downloader::Downloader;
use tq_core::events::{ChannelListener, EventMessage, Listener};
use tq_core::link::{ParsedLink, Service};
use tq_core::object::{ConvertableObject, TrackFailure};
use tq_core::resolver::{Plugin, PluginRegistry, ResolvedItem, ResolvedMeta, Resolver};
use tq_core::{
    Bitrate, Client, Collaborators, DownloadError, DownloadObject, EngineSettings, QueueEngine,
    QueueStore, ResolveError,
};

#[derive(Debug, Clone, Copy)]
pub struct FakeClient {
    pub logged_in: bool,
    pub lossless: bool,
    pub hq: bool,
}

impl FakeClient {
    pub fn premium() -> Arc<Self> {
        Arc::new(Self {
            logged_in: true,
            lossless: true,
            hq: true,
        })
    }

    pub fn free() -> Arc<Self> {
        Arc::new(Self {
            logged_in: true,
            lossless: false,
            hq: false,
        })
    }

    pub fn logged_out() -> Arc<Self> {
        Arc::new(Self {
            logged_in: false,
            lossless: false,
            hq: false,
        })
    }
}

impl Client for FakeClient {
    fn is_logged_in(&self) -> bool {
        self.logged_in
    }
    fn can_stream_lossless(&self) -> bool {
        self.lossless
    }
    fn can_stream_hq(&self) -> bool {
        self.hq
    }
}

pub fn deezer(kind: &str, id: &str) -> String {
    format!("https://www.deezer.com/{}/{}", kind, id)
}

fn meta(link_type: &str, id: &str) -> ResolvedMeta {
    ResolvedMeta {
        link_type: link_type.to_string(),
        id: id.to_string(),
        title: format!("{} {}", link_type, id),
        artist: "Various".to_string(),
        ..Default::default()
    }
}

pub fn track_item(id: &str) -> ResolvedItem {
    ResolvedItem::Single {
        meta: meta("track", id),
        track: json!({ "id": id }),
        album: None,
    }
}

pub fn album_item(id: &str, tracks: usize) -> ResolvedItem {
    ResolvedItem::Collection {
        meta: meta("album", id),
        tracks: (0..tracks).map(|i| json!({ "id": i })).collect(),
        album: Some(json!({ "id": id })),
        playlist: None,
    }
}

/// Primary-catalog item that names a plugin nobody registered.
pub fn orphan_convertable(id: &str) -> ResolvedItem {
    ResolvedItem::Convertable {
        meta: meta("tidal_track", id),
        size: 1,
        plugin: "tidal".to_string(),
        conversion_data: json!({ "id": id }),
    }
}

/// Resolver answering from a fixed table keyed by link.
#[derive(Default)]
pub struct ScriptedResolver {
    answers: HashMap<String, Vec<ResolvedItem>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, link: impl Into<String>, items: Vec<ResolvedItem>) -> Self {
        self.answers.insert(link.into(), items);
        self
    }
}

#[async_trait]
impl Resolver<FakeClient> for ScriptedResolver {
    async fn resolve(
        &self,
        _client: &FakeClient,
        link: &ParsedLink,
        _bitrate: Bitrate,
    ) -> Result<Vec<ResolvedItem>, ResolveError> {
        self.answers
            .get(&link.link)
            .cloned()
            .ok_or_else(|| ResolveError::new("Item not found").with_errid("notFound"))
    }
}

/// Secondary-catalog plugin. Ids starting with `broken` fail to convert.
pub struct ConvertingPlugin;

#[async_trait]
impl Plugin<FakeClient> for ConvertingPlugin {
    fn name(&self) -> &str {
        "spotify"
    }

    fn service(&self) -> Service {
        Service::Spotify
    }

    async fn generate(
        &self,
        _client: &FakeClient,
        link: &ParsedLink,
        _bitrate: Bitrate,
    ) -> Result<Vec<ResolvedItem>, ResolveError> {
        Ok(vec![ResolvedItem::Convertable {
            meta: meta(&format!("spotify_{}", link.link_type), &link.id),
            size: 1,
            plugin: self.name().to_string(),
            conversion_data: json!({ "id": link.id, "fail": link.id.starts_with("broken") }),
        }])
    }

    async fn convert(
        &self,
        _client: &FakeClient,
        item: ConvertableObject,
    ) -> Result<DownloadObject, ResolveError> {
        if item.conversion_data["fail"].as_bool().unwrap_or(false) {
            return Err(ResolveError::new("Track not found on Deezer").with_errid("notOnDeezer"));
        }
        let bitrate = item.header.essential.bitrate;
        Ok(tq_core::factory::into_object(track_item("777"), bitrate))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Leading tracks that fail.
    pub failed: u32,
    /// Give up on the whole item with this message.
    pub error: Option<String>,
    /// After this many tracks, wait for `release`.
    pub hold_after: Option<u32>,
    /// Panic instead of downloading.
    pub panic: bool,
}

/// Downloader that fakes per-track outcomes.
pub struct ScriptedDownloader {
    scripts: Mutex<HashMap<String, Script>>,
    held: Mutex<HashSet<String>>,
    gate: Semaphore,
    started: Notify,
    paused: Notify,
    running: AtomicUsize,
    max_running: AtomicUsize,
    runs: Mutex<Vec<String>>,
}

impl ScriptedDownloader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
            held: Mutex::new(HashSet::new()),
            gate: Semaphore::new(0),
            started: Notify::new(),
            paused: Notify::new(),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            runs: Mutex::new(Vec::new()),
        })
    }

    pub fn script(&self, uuid: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(uuid.to_string(), script);
    }

    /// Make `uuid` wait for `release` once it starts.
    pub fn hold(&self, uuid: &str) {
        self.held.lock().unwrap().insert(uuid.to_string());
    }

    /// Let `n` held items continue.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Resolves once an item scripted with `hold_after` is waiting.
    pub async fn wait_paused(&self) {
        self.paused.notified().await;
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Downloader<FakeClient> for ScriptedDownloader {
    async fn run(
        &self,
        _client: &FakeClient,
        object: &mut DownloadObject,
        _listener: &dyn Listener,
    ) -> Result<(), DownloadError> {
        let uuid = object.uuid().to_string();
        self.runs.lock().unwrap().push(uuid.clone());
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        self.started.notify_one();

        let held = self.held.lock().unwrap().contains(&uuid);
        if held {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&uuid)
            .cloned()
            .unwrap_or_default();
        if script.panic {
            panic!("scripted downloader panic on {}", uuid);
        }
        let result = match script.error {
            Some(message) => Err(DownloadError::Failed(message)),
            None => {
                let mut outcome = Ok(());
                for i in 0..object.header().size() {
                    if script.hold_after == Some(i) {
                        self.paused.notify_one();
                        if let Ok(permit) = self.gate.acquire().await {
                            permit.forget();
                        }
                    }
                    if object.is_canceled() {
                        outcome = Err(DownloadError::Canceled);
                        break;
                    }
                    let header = object.header_mut();
                    if i < script.failed {
                        header.record_failure(
                            TrackFailure::new("Track not available").with_errid("notAvailable"),
                        );
                    } else {
                        header.record_success(json!({ "track": i }));
                    }
                }
                outcome
            }
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub struct Rig {
    pub engine: QueueEngine<FakeClient>,
    pub downloader: Arc<ScriptedDownloader>,
    pub events: UnboundedReceiver<EventMessage>,
}

impl Rig {
    pub fn drain_events(&mut self) -> Vec<EventMessage> {
        drain_events(&mut self.events)
    }
}

pub fn drain_events(rx: &mut UnboundedReceiver<EventMessage>) -> Vec<EventMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

pub fn names(events: &[EventMessage]) -> Vec<&str> {
    events.iter().map(|e| e.name.as_str()).collect()
}

pub fn rig(dir: &Path, resolver: ScriptedResolver) -> Rig {
    rig_with(dir, resolver, EngineSettings::default(), ScriptedDownloader::new())
}

pub fn rig_with(
    dir: &Path,
    resolver: ScriptedResolver,
    settings: EngineSettings,
    downloader: Arc<ScriptedDownloader>,
) -> Rig {
    let mut plugins = PluginRegistry::new();
    plugins.register(Arc::new(ConvertingPlugin));
    let collab = Collaborators {
        resolver: Arc::new(resolver),
        plugins,
        downloader: downloader.clone(),
    };
    let (listener, events) = ChannelListener::new();
    let engine = QueueEngine::open(
        QueueStore::open(dir).unwrap(),
        collab,
        settings,
        Arc::new(listener),
    )
    .unwrap();
    Rig {
        engine,
        downloader,
        events,
    }
}
