use super::*;

#[test]
fn parses_duration_and_stream_kinds() {
    let json = br#"{
        "streams": [
            {"index": 0, "codec_type": "video", "width": 64},
            {"index": 1, "codec_type": "audio"}
        ],
        "format": {"duration": "10.016000", "format_name": "mov,mp4"}
    }"#;
    let info = parse_probe_json(Path::new("a.mp4"), json).unwrap();
    assert!(info.has_video);
    assert!(info.has_audio);
    assert!((info.duration_secs.unwrap() - 10.016).abs() < 1e-9);
}

#[test]
fn missing_or_garbage_duration_is_none() {
    let json = br#"{"streams": [{"codec_type": "video"}], "format": {"duration": "N/A"}}"#;
    let info = parse_probe_json(Path::new("a.mp4"), json).unwrap();
    assert!(info.duration_secs.is_none());
    assert!(!info.has_audio);

    let json = br#"{"format": {}}"#;
    let info = parse_probe_json(Path::new("a.wav"), json).unwrap();
    assert!(info.duration_secs.is_none());
    assert!(!info.has_video);
}

#[test]
fn malformed_json_is_serde_error() {
    let err = parse_probe_json(Path::new("a.mp4"), b"not json").unwrap_err();
    assert!(matches!(err, RedubError::Serde(_)));
}

#[test]
fn unreadable_source_duration_is_zero() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(probe_duration_or_zero(&dir.path().join("missing.mp4")), 0.0);
}
