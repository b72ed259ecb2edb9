use super::*;
use crate::config::settings::DEFAULT_AUDIO_BITRATE_KBPS;

#[test]
fn muted_path_keeps_extension() {
    assert_eq!(
        muted_path_for(Path::new("/videos/talk.mp4")),
        PathBuf::from("/videos/talk.muted.mp4")
    );
    assert_eq!(
        muted_path_for(Path::new("clip")),
        PathBuf::from("clip.muted")
    );
}

#[test]
fn guard_removes_temporary_file() {
    let dir = tempfile::tempdir().unwrap();
    let tmp = dir.path().join("bed.temp.wav");
    std::fs::write(&tmp, b"x").unwrap();
    drop(TempFileGuard::new(&tmp, &dir.path().join("out.mp4")));
    assert!(!tmp.exists());
}

#[test]
fn guard_never_removes_the_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.mp4");
    std::fs::write(&out, b"x").unwrap();
    drop(TempFileGuard::new(&out, &out));
    assert!(out.exists());
}

#[test]
fn missing_source_is_input_error_and_bed_is_cleaned() {
    let dir = tempfile::tempdir().unwrap();
    let bed = dir.path().join("out.temp.wav");
    std::fs::write(&bed, b"RIFF").unwrap();

    let err = replace_audio_track(
        &dir.path().join("missing.mp4"),
        &bed,
        &dir.path().join("out.mp4"),
        DEFAULT_AUDIO_BITRATE_KBPS,
    )
    .unwrap_err();

    assert!(matches!(err, RedubError::Input(_)));
    assert!(!bed.exists());
    assert!(!dir.path().join("out.mp4").exists());
}

#[test]
fn zero_bitrate_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = mux_audio(
        &dir.path().join("v.mp4"),
        &dir.path().join("a.wav"),
        &dir.path().join("o.mp4"),
        0,
    )
    .unwrap_err();
    assert!(matches!(err, RedubError::Validation(_)));
}

#[test]
fn failed_strip_removes_partial_muted_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("talk.mp4");
    std::fs::write(&source, b"not a video").unwrap();
    let bed = dir.path().join("talk.dubbed.temp.wav");
    std::fs::write(&bed, b"RIFF").unwrap();
    // Leftover from an interrupted strip.
    let muted = muted_path_for(&source);
    std::fs::write(&muted, b"partial").unwrap();

    let output = dir.path().join("talk.dubbed.mp4");
    let err = replace_audio_track(&source, &bed, &output, DEFAULT_AUDIO_BITRATE_KBPS).unwrap_err();

    assert!(matches!(err, RedubError::Remux(_)));
    assert!(!muted.exists());
    assert!(!bed.exists());
    assert!(!output.exists());
    assert!(source.exists());
}
