//! Queue lifecycle events and the listener sink they are delivered to.
//!
//! Event names are a stable contract with front ends; payload shapes follow
//! the JSON each front end already consumes.

use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::object::{EssentialSummary, SlimmedSummary};

/// Event sink. Called synchronously, in emission order. Must not block.
pub trait Listener: Send + Sync {
    fn send(&self, event: &str, payload: Value);
}

#[derive(Debug, Clone)]
pub enum QueueEvent {
    StartGeneratingItems { uuid: String, total: usize },
    FinishGeneratingItems { uuid: String, total: usize },
    AlreadyInQueue(EssentialSummary),
    QueueError {
        link: String,
        error: String,
        errid: Option<String>,
    },
    AddedToQueue(Vec<SlimmedSummary>),
    StartDownload { uuid: String },
    CancellingCurrentItem { uuid: String },
    RemovedFromQueue { uuid: String },
    RemovedAllDownloads { current: Option<String> },
    RemovedFinishedDownloads,
}

impl QueueEvent {
    pub fn name(&self) -> &'static str {
        match self {
            QueueEvent::StartGeneratingItems { .. } => "startGeneratingItems",
            QueueEvent::FinishGeneratingItems { .. } => "finishGeneratingItems",
            QueueEvent::AlreadyInQueue(_) => "alreadyInQueue",
            QueueEvent::QueueError { .. } => "queueError",
            QueueEvent::AddedToQueue(_) => "addedToQueue",
            QueueEvent::StartDownload { .. } => "startDownload",
            QueueEvent::CancellingCurrentItem { .. } => "cancellingCurrentItem",
            QueueEvent::RemovedFromQueue { .. } => "removedFromQueue",
            QueueEvent::RemovedAllDownloads { .. } => "removedAllDownloads",
            QueueEvent::RemovedFinishedDownloads => "removedFinishedDownloads",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            QueueEvent::StartGeneratingItems { uuid, total }
            | QueueEvent::FinishGeneratingItems { uuid, total } => {
                json!({ "uuid": uuid, "total": total })
            }
            QueueEvent::AlreadyInQueue(summary) => to_value(summary),
            QueueEvent::QueueError { link, error, errid } => {
                json!({ "link": link, "error": error, "errid": errid })
            }
            // A single added item is sent bare, anything else as a list.
            QueueEvent::AddedToQueue(items) => match items.as_slice() {
                [one] => to_value(one),
                many => to_value(&many),
            },
            QueueEvent::StartDownload { uuid } | QueueEvent::CancellingCurrentItem { uuid } => {
                Value::String(uuid.clone())
            }
            QueueEvent::RemovedFromQueue { uuid } => json!({ "uuid": uuid }),
            QueueEvent::RemovedAllDownloads { current } => match current {
                Some(uuid) => Value::String(uuid.clone()),
                None => Value::Null,
            },
            QueueEvent::RemovedFinishedDownloads => Value::Null,
        }
    }

    pub(crate) fn emit(&self, listener: &dyn Listener) {
        listener.send(self.name(), self.payload());
    }
}

fn to_value<T: serde::Serialize + ?Sized>(v: &T) -> Value {
    serde_json::to_value(v).unwrap_or_default()
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullListener;

impl Listener for NullListener {
    fn send(&self, _event: &str, _payload: Value) {}
}

/// Logs every event at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl Listener for TracingListener {
    fn send(&self, event: &str, payload: Value) {
        tracing::debug!(event, %payload, "queue event");
    }
}

/// One delivered event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    pub name: String,
    pub payload: Value,
}

/// Forwards events into an unbounded channel, preserving call order.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<EventMessage>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EventMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Listener for ChannelListener {
    fn send(&self, event: &str, payload: Value) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send(EventMessage {
            name: event.to_string(),
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Bitrate, DownloadHeader};

    fn slim(uuid_id: &str) -> SlimmedSummary {
        let header = DownloadHeader::new("track", uuid_id, Bitrate::MP3_128, "T", "A", 1);
        SlimmedSummary {
            essential: header.essential,
            outcome: header.outcome,
        }
    }

    #[test]
    fn added_to_queue_single_vs_many() {
        let one = QueueEvent::AddedToQueue(vec![slim("1")]).payload();
        assert!(one.is_object());
        assert_eq!(one["uuid"], "track_1_1");

        let two = QueueEvent::AddedToQueue(vec![slim("1"), slim("2")]).payload();
        assert_eq!(two.as_array().map(Vec::len), Some(2));

        let none = QueueEvent::AddedToQueue(Vec::new()).payload();
        assert_eq!(none, json!([]));
    }

    #[test]
    fn payload_shapes() {
        let e = QueueEvent::QueueError {
            link: "x".into(),
            error: "bad".into(),
            errid: None,
        };
        assert_eq!(e.name(), "queueError");
        assert_eq!(e.payload(), json!({"link": "x", "error": "bad", "errid": null}));

        let e = QueueEvent::RemovedAllDownloads { current: None };
        assert_eq!(e.payload(), Value::Null);
        let e = QueueEvent::StartDownload { uuid: "track_1_1".into() };
        assert_eq!(e.payload(), json!("track_1_1"));
        let e = QueueEvent::RemovedFromQueue { uuid: "track_1_1".into() };
        assert_eq!(e.payload(), json!({"uuid": "track_1_1"}));
    }

    #[tokio::test]
    async fn channel_listener_preserves_order() {
        let (listener, mut rx) = ChannelListener::new();
        QueueEvent::StartDownload { uuid: "a".into() }.emit(&listener);
        QueueEvent::RemovedFinishedDownloads.emit(&listener);
        assert_eq!(rx.recv().await.unwrap().name, "startDownload");
        assert_eq!(rx.recv().await.unwrap().name, "removedFinishedDownloads");
    }
}
