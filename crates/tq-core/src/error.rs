//! Error taxonomy for the queue engine.
//!
//! Per-link and per-item failures are caught at the item boundary and turned
//! into `queueError` events or a terminal status. Precondition failures
//! (`NotLoggedIn`, `CantStream`) and store failures propagate to the caller.

use std::path::PathBuf;
use thiserror::Error;

use crate::object::Bitrate;

/// Errors surfaced by the public queue API.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Input is not a link at all.
    #[error("link not recognized: {link}")]
    LinkParse { link: String },

    /// A well-formed link that no resolver or plugin handles.
    #[error("link not supported: {link}")]
    UnsupportedLink { link: String },

    #[error("not logged in")]
    NotLoggedIn,

    #[error("your account can't stream at bitrate {0}")]
    CantStream(Bitrate),

    /// A convertable item names a plugin that is not registered.
    #[error("no plugin registered under \"{name}\"")]
    UnknownPlugin { name: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueueError {
    /// Stable identifier carried in `queueError` payloads.
    pub fn errid(&self) -> Option<&str> {
        match self {
            QueueError::LinkParse { .. } => Some("invalidURL"),
            QueueError::UnsupportedLink { .. } => Some("unsupportedURL"),
            QueueError::NotLoggedIn => Some("notLoggedIn"),
            QueueError::CantStream(_) => Some("cantStream"),
            QueueError::UnknownPlugin { .. } => Some("unknownPlugin"),
            QueueError::Resolve(e) => e.errid.as_deref(),
            QueueError::Store(_) => Some("storeError"),
        }
    }

    /// The link this error is about, when known.
    pub fn link(&self) -> Option<&str> {
        match self {
            QueueError::LinkParse { link } | QueueError::UnsupportedLink { link } => Some(link),
            QueueError::Resolve(e) => e.link.as_deref(),
            _ => None,
        }
    }
}

/// Failure reported by a resolver or plugin while building or converting a
/// descriptor.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ResolveError {
    pub link: Option<String>,
    pub message: String,
    pub errid: Option<String>,
}

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            link: None,
            message: message.into(),
            errid: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_errid(mut self, errid: impl Into<String>) -> Self {
        self.errid = Some(errid.into());
        self
    }

    /// Fill in the link if the resolver did not set one.
    pub(crate) fn or_link(mut self, link: &str) -> Self {
        if self.link.is_none() {
            self.link = Some(link.to_string());
        }
        self
    }
}

/// Queue directory I/O failures. Fatal to the operation that hit them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("queue store I/O at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialize queue record {id}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("parse queue record {id}")]
    Parse {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Ids double as file names; anything that could escape the queue
    /// directory or shadow the order file is refused.
    #[error("invalid queue id: {id:?}")]
    InvalidId { id: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a persisted record was discarded during recovery. Logged, never
/// surfaced.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unparseable record: {0}")]
    Unparseable(#[from] serde_json::Error),

    #[error("record was produced by an incompatible resolver version")]
    SchemaIncompatible,
}

/// Returned by a `Downloader` that could not run the item at all. Per-track
/// failures are counted on the descriptor instead.
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    #[error("download canceled")]
    Canceled,

    #[error("download failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errids_for_link_errors() {
        let e = QueueError::LinkParse {
            link: "nope".to_string(),
        };
        assert_eq!(e.errid(), Some("invalidURL"));
        assert_eq!(e.link(), Some("nope"));

        let e = QueueError::UnsupportedLink {
            link: "https://example.com/x".to_string(),
        };
        assert_eq!(e.errid(), Some("unsupportedURL"));
    }

    #[test]
    fn resolve_error_keeps_its_own_errid_and_link() {
        let e: QueueError = ResolveError::new("Track not found")
            .with_errid("notOnDeezer")
            .or_link("https://www.deezer.com/track/1")
            .into();
        assert_eq!(e.errid(), Some("notOnDeezer"));
        assert_eq!(e.link(), Some("https://www.deezer.com/track/1"));
        assert_eq!(e.to_string(), "Track not found");
    }

    #[test]
    fn or_link_does_not_override() {
        let e = ResolveError::new("x").with_link("a").or_link("b");
        assert_eq!(e.link.as_deref(), Some("a"));
    }

    #[test]
    fn cant_stream_mentions_bitrate() {
        let e = QueueError::CantStream(Bitrate::FLAC);
        assert_eq!(e.to_string(), "your account can't stream at bitrate 9");
    }
}
