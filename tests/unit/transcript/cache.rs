use super::*;

fn segments() -> Vec<TimedSegment> {
    vec![
        TimedSegment::new(0.0, 4.0, "Hallo").unwrap(),
        TimedSegment::new(4.0, 10.0, "Welt").unwrap(),
    ]
}

#[test]
fn store_then_load_hits() {
    let dir = tempfile::tempdir().unwrap();
    let audio = dir.path().join("talk.wav");
    std::fs::write(&audio, b"fake audio bytes").unwrap();

    let store = TranscriptStore::new(dir.path().join("cache"));
    assert!(store.load(&audio).is_none());
    let written = store.store(&audio, &segments()).unwrap();
    assert!(written.ends_with(format!("{}.transcript.json", store.key_for(&audio).unwrap())));
    assert_eq!(store.load(&audio).unwrap(), segments());
}

#[test]
fn key_follows_content_not_path() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");
    std::fs::write(&a, b"same").unwrap();
    std::fs::write(&b, b"same").unwrap();
    let store = TranscriptStore::new(dir.path());
    assert_eq!(store.key_for(&a).unwrap(), store.key_for(&b).unwrap());
    assert_eq!(store.key_for(&a).unwrap().len(), 64);

    std::fs::write(&b, b"different").unwrap();
    assert_ne!(store.key_for(&a).unwrap(), store.key_for(&b).unwrap());
}

#[test]
fn corrupt_entry_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let audio = dir.path().join("talk.wav");
    std::fs::write(&audio, b"audio").unwrap();
    let store = TranscriptStore::new(dir.path());

    let entry = store.entry_path(&store.key_for(&audio).unwrap());
    std::fs::write(&entry, b"{ not json").unwrap();
    assert!(store.load(&audio).is_none());

    std::fs::write(&entry, br#"[{"start": 5.0, "end": 1.0, "text": "inverted"}]"#).unwrap();
    assert!(store.load(&audio).is_none());
}

#[test]
fn missing_audio_is_a_miss_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = TranscriptStore::new(dir.path());
    assert!(store.load(&dir.path().join("nope.wav")).is_none());
    assert!(store.store(&dir.path().join("nope.wav"), &segments()).is_none());
}
