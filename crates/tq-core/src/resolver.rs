//! Resolver and plugin interfaces for turning a parsed link into queueable
//! items.
//!
//! The engine never talks to a catalog API itself. A `Resolver` handles the
//! primary catalog; `Plugin`s handle other services and convert their items
//! into primary-catalog descriptors right before download.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ResolveError;
use crate::link::{ParsedLink, Service};
use crate::object::{Bitrate, ConvertableObject, DownloadObject};

/// Account handle passed through to resolvers, plugins and the downloader.
/// The engine only asks about entitlements.
pub trait Client: Send + Sync + 'static {
    fn is_logged_in(&self) -> bool;
    fn can_stream_lossless(&self) -> bool;
    fn can_stream_hq(&self) -> bool;
}

/// Listing fields every resolved item carries.
#[derive(Debug, Clone, Default)]
pub struct ResolvedMeta {
    /// Link type used in the item id (`track`, `album`, `playlist`, ...).
    pub link_type: String,
    pub id: String,
    pub title: String,
    pub artist: String,
    pub cover: String,
    pub explicit: bool,
}

/// Untyped resolver output. The factory turns each one into a
/// `DownloadObject` and assigns its id.
#[derive(Debug, Clone)]
pub enum ResolvedItem {
    Single {
        meta: ResolvedMeta,
        track: Value,
        album: Option<Value>,
    },
    Collection {
        meta: ResolvedMeta,
        tracks: Vec<Value>,
        album: Option<Value>,
        playlist: Option<Value>,
    },
    Convertable {
        meta: ResolvedMeta,
        size: u32,
        plugin: String,
        conversion_data: Value,
    },
}

/// Resolves primary-catalog links.
#[async_trait]
pub trait Resolver<C: Client>: Send + Sync {
    async fn resolve(
        &self,
        client: &C,
        link: &ParsedLink,
        bitrate: Bitrate,
    ) -> Result<Vec<ResolvedItem>, ResolveError>;
}

/// Handles links of a secondary service.
#[async_trait]
pub trait Plugin<C: Client>: Send + Sync {
    /// Name stored in `Convertable.plugin`.
    fn name(&self) -> &str;

    /// Service whose links this plugin generates items for.
    fn service(&self) -> Service;

    async fn generate(
        &self,
        client: &C,
        link: &ParsedLink,
        bitrate: Bitrate,
    ) -> Result<Vec<ResolvedItem>, ResolveError>;

    /// Map a queued convertable to a `Single` or `Collection`.
    async fn convert(
        &self,
        client: &C,
        item: ConvertableObject,
    ) -> Result<DownloadObject, ResolveError>;
}

/// Plugins keyed by name.
pub struct PluginRegistry<C: Client> {
    plugins: HashMap<String, Arc<dyn Plugin<C>>>,
}

impl<C: Client> Default for PluginRegistry<C> {
    fn default() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }
}

impl<C: Client> PluginRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `plugin` under its name, replacing any previous one.
    pub fn register(&mut self, plugin: Arc<dyn Plugin<C>>) {
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin<C>>> {
        self.plugins.get(name)
    }

    /// The plugin that owns links of `service`, if any.
    pub fn for_service(&self, service: Service) -> Option<&Arc<dyn Plugin<C>>> {
        self.plugins.values().find(|p| p.service() == service)
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
