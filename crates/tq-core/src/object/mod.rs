//! Download descriptors: everything needed to execute one queue item.
//!
//! `DownloadObject` is a closed union serialized with a `__type__`
//! discriminator. Three places match on it exhaustively: the factory (typing
//! resolver output), the scheduler (materializing convertables) and recovery
//! (schema checks). A new variant has to be handled in all three.

mod summary;

#[cfg(test)]
mod tests;

pub use summary::{EssentialSummary, ItemStatus, Outcome, QueueEntry, SlimmedSummary, TrackFailure};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::control::{CancelToken, ProgressHandle};

/// Requested audio format, using the catalog's numeric format codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bitrate(pub u8);

impl Bitrate {
    pub const MP3_128: Bitrate = Bitrate(1);
    pub const MP3_320: Bitrate = Bitrate(3);
    pub const FLAC: Bitrate = Bitrate(9);

    /// Needs a lossless-capable account.
    pub fn is_lossless(self) -> bool {
        self == Bitrate::FLAC
    }

    /// Needs an HQ-capable account.
    pub fn is_high_quality(self) -> bool {
        self == Bitrate::MP3_320
    }
}

impl Default for Bitrate {
    fn default() -> Self {
        Bitrate::MP3_128
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminator of a `DownloadObject`, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Single,
    Collection,
    Convertable,
}

/// Fields shared by every descriptor variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadHeader {
    #[serde(flatten)]
    pub essential: EssentialSummary,
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(skip)]
    pub cancel: CancelToken,
    /// Counters as last published, readable while the downloader runs.
    #[serde(skip)]
    pub live: ProgressHandle,
}

impl DownloadHeader {
    /// New header with zeroed counters. The id is `{type}_{id}_{bitrate}`, so
    /// the same content at the same bitrate always maps to the same item.
    pub fn new(
        link_type: impl Into<String>,
        id: impl Into<String>,
        bitrate: Bitrate,
        title: impl Into<String>,
        artist: impl Into<String>,
        size: u32,
    ) -> Self {
        let link_type = link_type.into();
        let id = id.into();
        Self {
            essential: EssentialSummary {
                uuid: format!("{}_{}_{}", link_type, id, bitrate),
                id,
                link_type,
                bitrate,
                title: title.into(),
                artist: artist.into(),
                cover: String::new(),
                explicit: false,
                size,
            },
            outcome: Outcome::default(),
            cancel: CancelToken::new(),
            live: ProgressHandle::new(),
        }
    }

    pub fn uuid(&self) -> &str {
        &self.essential.uuid
    }

    pub fn size(&self) -> u32 {
        self.essential.size
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    /// Count one track as written to disk.
    pub fn record_success(&mut self, file: Value) {
        self.outcome.downloaded += 1;
        self.outcome.files.push(file);
        self.refresh_progress();
    }

    /// Count one track as failed.
    pub fn record_failure(&mut self, failure: TrackFailure) {
        self.outcome.failed += 1;
        self.outcome.errors.push(failure);
        self.refresh_progress();
    }

    fn refresh_progress(&mut self) {
        let size = self.essential.size;
        if size > 0 {
            let done = self.outcome.downloaded + self.outcome.failed;
            self.outcome.progress = f64::from(done.min(size)) * 100.0 / f64::from(size);
        }
        self.publish_progress();
    }

    /// Push the current counters to the progress handle. Downloaders that
    /// edit `outcome` directly call this when they want it seen.
    pub fn publish_progress(&self) {
        self.live.publish(&self.outcome);
    }

    /// Terminal status implied by the counters.
    pub fn terminal_status(&self) -> ItemStatus {
        ItemStatus::from_counts(self.essential.size, self.outcome.failed)
    }
}

/// A single track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleObject {
    #[serde(flatten)]
    pub header: DownloadHeader,
    pub single: SinglePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinglePayload {
    #[serde(rename = "trackAPI")]
    pub track: Value,
    #[serde(rename = "albumAPI", default, skip_serializing_if = "Option::is_none")]
    pub album: Option<Value>,
    /// Only present in records written by the old gateway-based resolver.
    #[serde(rename = "trackAPI_gw", default, skip_serializing_if = "Option::is_none")]
    pub legacy_track: Option<Value>,
}

/// An album, playlist or artist page: a list of tracks run as one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionObject {
    #[serde(flatten)]
    pub header: DownloadHeader,
    pub collection: CollectionPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionPayload {
    #[serde(default)]
    pub tracks: Vec<Value>,
    #[serde(rename = "albumAPI", default, skip_serializing_if = "Option::is_none")]
    pub album: Option<Value>,
    #[serde(rename = "playlistAPI", default, skip_serializing_if = "Option::is_none")]
    pub playlist: Option<Value>,
    /// Only present in records written by the old gateway-based resolver.
    #[serde(rename = "tracks_gw", default, skip_serializing_if = "Option::is_none")]
    pub legacy_tracks: Option<Vec<Value>>,
}

/// An item from another catalog. The owning plugin maps it to a concrete
/// `Single` or `Collection` right before it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertableObject {
    #[serde(flatten)]
    pub header: DownloadHeader,
    pub plugin: String,
    #[serde(default)]
    pub conversion_data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "__type__")]
pub enum DownloadObject {
    Single(SingleObject),
    Collection(CollectionObject),
    Convertable(ConvertableObject),
}

impl DownloadObject {
    pub fn header(&self) -> &DownloadHeader {
        match self {
            DownloadObject::Single(o) => &o.header,
            DownloadObject::Collection(o) => &o.header,
            DownloadObject::Convertable(o) => &o.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut DownloadHeader {
        match self {
            DownloadObject::Single(o) => &mut o.header,
            DownloadObject::Collection(o) => &mut o.header,
            DownloadObject::Convertable(o) => &mut o.header,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            DownloadObject::Single(_) => ItemKind::Single,
            DownloadObject::Collection(_) => ItemKind::Collection,
            DownloadObject::Convertable(_) => ItemKind::Convertable,
        }
    }

    pub fn uuid(&self) -> &str {
        self.header().uuid()
    }

    pub fn essential(&self) -> EssentialSummary {
        self.header().essential.clone()
    }

    pub fn slimmed(&self) -> SlimmedSummary {
        let header = self.header();
        SlimmedSummary {
            essential: header.essential.clone(),
            outcome: header.outcome.clone(),
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.header().is_canceled()
    }
}
