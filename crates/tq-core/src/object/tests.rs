//! Tests for descriptor serialization and summary projections.

use serde_json::json;

use super::*;

fn sample_collection() -> DownloadObject {
    let mut header = DownloadHeader::new("album", "302127", Bitrate::FLAC, "Discovery", "Daft Punk", 3);
    header.essential.cover = "https://e-cdns-images.dzcdn.net/images/cover/x.jpg".to_string();
    DownloadObject::Collection(CollectionObject {
        header,
        collection: CollectionPayload {
            tracks: vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})],
            album: Some(json!({"id": 302127})),
            playlist: None,
            legacy_tracks: None,
        },
    })
}

#[test]
fn uuid_is_type_id_bitrate() {
    let header = DownloadHeader::new("track", "3135556", Bitrate::MP3_320, "Harder", "Daft Punk", 1);
    assert_eq!(header.uuid(), "track_3135556_3");
}

#[test]
fn bitrate_codes_and_account_requirements() {
    assert_eq!(Bitrate::default(), Bitrate::MP3_128);
    assert_eq!(serde_json::to_value(Bitrate::FLAC).unwrap(), json!(9));
    assert!(Bitrate::FLAC.is_lossless());
    assert!(!Bitrate::FLAC.is_high_quality());
    assert!(Bitrate::MP3_320.is_high_quality());
    assert!(!Bitrate::MP3_128.is_lossless());
}

#[test]
fn serializes_with_type_tag_and_original_field_names() {
    let value = serde_json::to_value(sample_collection()).unwrap();
    assert_eq!(value["__type__"], "Collection");
    assert_eq!(value["uuid"], "album_302127_9");
    assert_eq!(value["type"], "album");
    assert_eq!(value["bitrate"], 9);
    assert_eq!(value["collection"]["albumAPI"]["id"], 302127);
    assert!(value["collection"].get("playlistAPI").is_none());
    assert!(value.get("cancel").is_none());
    assert!(value.get("extrasPath").is_none());
}

#[test]
fn deserializes_back_to_same_variant() {
    let text = serde_json::to_string(&sample_collection()).unwrap();
    let back: DownloadObject = serde_json::from_str(&text).unwrap();
    assert_eq!(back.kind(), ItemKind::Collection);
    assert_eq!(back.uuid(), "album_302127_9");
    assert_eq!(back.header().size(), 3);
    assert!(!back.is_canceled());
}

#[test]
fn unknown_type_tag_is_rejected() {
    let value = json!({
        "__type__": "Mystery",
        "uuid": "x_1_1", "id": "1", "type": "x", "bitrate": 1,
        "title": "", "artist": "", "size": 1
    });
    assert!(serde_json::from_value::<DownloadObject>(value).is_err());
}

#[test]
fn progress_tracks_both_outcomes() {
    let mut obj = sample_collection();
    let header = obj.header_mut();
    header.record_success(json!({"path": "/music/1.flac"}));
    header.record_failure(TrackFailure::new("Track not available").with_errid("notAvailable"));
    assert_eq!(header.outcome.downloaded, 1);
    assert_eq!(header.outcome.failed, 1);
    assert!((header.outcome.progress - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(header.terminal_status(), ItemStatus::WithErrors);
}

#[test]
fn recorded_tracks_are_published_to_the_live_handle() {
    let mut obj = sample_collection();
    let watcher = obj.header().live.clone();
    obj.header_mut().record_success(json!({"path": "/music/1.flac"}));
    let seen = watcher.latest();
    assert_eq!(seen.downloaded, 1);
    assert_eq!(seen.files.len(), 1);
    assert!(seen.progress > 0.0);
}

#[test]
fn status_from_counts() {
    assert_eq!(ItemStatus::from_counts(3, 0), ItemStatus::Completed);
    assert_eq!(ItemStatus::from_counts(3, 1), ItemStatus::WithErrors);
    assert_eq!(ItemStatus::from_counts(3, 3), ItemStatus::Failed);
    assert_eq!(ItemStatus::from_counts(0, 0), ItemStatus::Completed);
}

#[test]
fn status_strings_match_serde() {
    for status in [
        ItemStatus::InQueue,
        ItemStatus::Downloading,
        ItemStatus::Completed,
        ItemStatus::Failed,
        ItemStatus::WithErrors,
    ] {
        let v = serde_json::to_value(status).unwrap();
        assert_eq!(v, status.as_str());
    }
    assert!(!ItemStatus::Downloading.is_terminal());
    assert!(ItemStatus::WithErrors.is_terminal());
}

#[test]
fn slimmed_summary_has_no_payload() {
    let slim = sample_collection().slimmed();
    let value = serde_json::to_value(&slim).unwrap();
    assert!(value.get("collection").is_none());
    assert!(value.get("__type__").is_none());
    assert_eq!(value["size"], 3);
    assert_eq!(value["downloaded"], 0);
}

#[test]
fn queue_entry_flattens_outcome_only_when_finished() {
    let obj = sample_collection();
    let queued = serde_json::to_value(QueueEntry::queued(obj.essential())).unwrap();
    assert_eq!(queued["status"], "inQueue");
    assert!(queued.get("downloaded").is_none());

    let done = QueueEntry::finished(obj.slimmed(), ItemStatus::Completed);
    let value = serde_json::to_value(&done).unwrap();
    assert_eq!(value["status"], "completed");
    assert_eq!(value["downloaded"], 0);
    assert_eq!(done.uuid(), "album_302127_9");
}
