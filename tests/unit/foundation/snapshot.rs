use super::*;

#[test]
fn sanitize_replaces_unsafe_characters() {
    assert_eq!(sanitize_token("my talk.wav"), "my_talk_wav");
    assert_eq!(sanitize_token("__a-b__"), "a-b");
    assert_eq!(sanitize_token("../../"), "prompt");
}

#[test]
fn snapshot_without_root_is_skipped() {
    assert!(save_snapshot(None, "tts", "x", "body", "txt").is_none());
}

#[test]
fn snapshots_never_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let first = save_snapshot(Some(dir.path()), "tts", "instruction", "one", ".txt").unwrap();
    let second = save_snapshot(Some(dir.path()), "tts", "instruction", "two", "txt").unwrap();
    let third = save_snapshot(Some(dir.path()), "tts", "instruction", "three", "").unwrap();

    assert_eq!(first, dir.path().join("prompts/tts/instruction.txt"));
    assert_eq!(second, dir.path().join("prompts/tts/instruction_2.txt"));
    assert_eq!(third, dir.path().join("prompts/tts/instruction_3.txt"));
    assert_eq!(std::fs::read_to_string(first).unwrap(), "one");
}

#[test]
fn empty_category_goes_to_general() {
    let dir = tempfile::tempdir().unwrap();
    let path = save_snapshot(Some(dir.path()), "", "req", "{}", "json").unwrap();
    assert_eq!(path, dir.path().join("prompts/general/req.json"));
}
