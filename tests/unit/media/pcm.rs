use super::*;

#[test]
fn silent_buffer_has_expected_frame_count() {
    let pcm = PcmBuffer::silent(1500);
    assert!(pcm.is_canonical());
    assert_eq!(pcm.frames(), 66_150);
    assert!((pcm.duration_secs() - 1.5).abs() < 1e-9);
    assert!(pcm.interleaved.iter().all(|&s| s == 0));
}

#[test]
fn ms_to_frames_floors() {
    assert_eq!(ms_to_frames(0, 44_100), 0);
    assert_eq!(ms_to_frames(1, 44_100), 44);
    assert_eq!(ms_to_frames(1000, 44_100), 44_100);
}

#[test]
fn silence_wav_is_at_least_one_millisecond() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/silence.wav");
    write_silence_wav(&path, 0).unwrap();

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec(), canonical_spec());
    assert_eq!(reader.duration(), 44);
}

#[test]
fn canonical_wav_decodes_without_ffmpeg() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    let pcm = PcmBuffer {
        sample_rate: CANONICAL_SAMPLE_RATE,
        channels: CANONICAL_CHANNELS,
        interleaved: vec![100, -100, 200, -200, i16::MAX, i16::MIN],
    };
    write_wav(&pcm, &path).unwrap();

    let back = decode_canonical(&path).unwrap();
    assert_eq!(back, pcm);
}
