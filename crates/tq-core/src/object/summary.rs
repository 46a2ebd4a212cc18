//! Lightweight projections of a queue item kept in memory and shown to
//! callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Bitrate;

/// Lifecycle of a queue item, stored as camelCase strings on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemStatus {
    InQueue,
    Downloading,
    Completed,
    Failed,
    WithErrors,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::InQueue => "inQueue",
            ItemStatus::Downloading => "downloading",
            ItemStatus::Completed => "completed",
            ItemStatus::Failed => "failed",
            ItemStatus::WithErrors => "withErrors",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ItemStatus::Completed | ItemStatus::Failed | ItemStatus::WithErrors
        )
    }

    /// `Failed` when every track failed, `WithErrors` when some did,
    /// `Completed` otherwise. An empty item never counts as failed.
    pub fn from_counts(size: u32, failed: u32) -> Self {
        if failed == size && size != 0 {
            ItemStatus::Failed
        } else if failed > 0 {
            ItemStatus::WithErrors
        } else {
            ItemStatus::Completed
        }
    }
}

/// Minimal listing projection, cheap to keep resident for every item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssentialSummary {
    pub uuid: String,
    pub id: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub bitrate: Bitrate,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub explicit: bool,
    pub size: u32,
}

/// Per-track failure recorded by the downloader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFailure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errid: Option<String>,
    /// Track metadata the downloader wants to show next to the error.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl TrackFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errid: None,
            data: Value::Null,
        }
    }

    pub fn with_errid(mut self, errid: impl Into<String>) -> Self {
        self.errid = Some(errid.into());
        self
    }
}

/// Counters and results written by the active job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    #[serde(default)]
    pub downloaded: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub errors: Vec<TrackFailure>,
    #[serde(default)]
    pub files: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras_path: Option<String>,
}

/// Summary safe to hand to external callers: no session data, just the
/// listing fields and the job's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlimmedSummary {
    #[serde(flatten)]
    pub essential: EssentialSummary,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// What the queue manager keeps in memory for each item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
    #[serde(flatten)]
    pub summary: EssentialSummary,
    pub status: ItemStatus,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl QueueEntry {
    pub fn queued(summary: EssentialSummary) -> Self {
        Self {
            summary,
            status: ItemStatus::InQueue,
            outcome: None,
        }
    }

    pub fn finished(slimmed: SlimmedSummary, status: ItemStatus) -> Self {
        Self {
            summary: slimmed.essential,
            status,
            outcome: Some(slimmed.outcome),
        }
    }

    pub fn uuid(&self) -> &str {
        &self.summary.uuid
    }
}
