use super::*;
use crate::media::pcm::{CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE};

fn clip(path: &Path, start: f64, end: f64) -> RenderedClip {
    RenderedClip {
        audio_path: path.to_path_buf(),
        start,
        end,
    }
}

fn constant(duration_ms: u64, value: i16) -> PcmBuffer {
    let mut pcm = PcmBuffer::silent(duration_ms);
    pcm.interleaved.fill(value);
    pcm
}

#[test]
fn ordering_is_by_start_and_stable() {
    let a = clip(Path::new("a.wav"), 2.0, 3.0);
    let b = clip(Path::new("b.wav"), 0.0, 1.0);
    let c = clip(Path::new("c.wav"), 2.0, 2.5);
    let clips = vec![a, b, c];
    let names: Vec<_> = order_clips(&clips)
        .into_iter()
        .map(|c| c.audio_path.to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["b.wav", "a.wav", "c.wav"]);
}

#[test]
fn total_duration_never_shorter_than_inputs() {
    let clips = vec![clip(Path::new("a.wav"), 0.0, 4.0), clip(Path::new("b.wav"), 4.0, 12.5)];
    assert_eq!(total_duration_secs(10.0, &clips), 12.5);
    assert_eq!(total_duration_secs(20.0, &clips), 20.0);
    assert_eq!(total_duration_secs(0.0, &[]), 0.001);
}

#[test]
fn overlapping_clips_are_summed() {
    let mut bed = PcmBuffer::silent(1000);
    overlay_additive(&mut bed, &constant(600, 1000), 0).unwrap();
    overlay_additive(&mut bed, &constant(400, 250), 400).unwrap();

    let ch = usize::from(CANONICAL_CHANNELS);
    let at_ms = |ms: u64| bed.interleaved[ms_to_frames(ms, CANONICAL_SAMPLE_RATE) * ch];
    assert_eq!(at_ms(100), 1000);
    assert_eq!(at_ms(500), 1250);
    assert_eq!(at_ms(700), 250);
    assert_eq!(at_ms(900), 0);
}

#[test]
fn overlap_saturates_instead_of_wrapping() {
    let mut bed = PcmBuffer::silent(10);
    overlay_additive(&mut bed, &constant(10, 30_000), 0).unwrap();
    overlay_additive(&mut bed, &constant(10, 30_000), 0).unwrap();
    assert!(bed.interleaved.iter().all(|&s| s == i16::MAX));

    let mut bed = PcmBuffer::silent(10);
    overlay_additive(&mut bed, &constant(10, -30_000), 0).unwrap();
    overlay_additive(&mut bed, &constant(10, -30_000), 0).unwrap();
    assert!(bed.interleaved.iter().all(|&s| s == i16::MIN));
}

#[test]
fn overrun_past_bed_end_is_truncated() {
    let mut bed = PcmBuffer::silent(100);
    overlay_additive(&mut bed, &constant(500, 7), 50).unwrap();
    assert_eq!(bed.frames(), ms_to_frames(100, CANONICAL_SAMPLE_RATE));
    assert_eq!(*bed.interleaved.last().unwrap(), 7);

    // Starting beyond the bed is a no-op.
    overlay_additive(&mut bed, &constant(10, 7), 5000).unwrap();
}

#[test]
fn mismatched_format_is_rejected() {
    let mut bed = PcmBuffer::silent(10);
    let mono = PcmBuffer {
        sample_rate: 24_000,
        channels: 1,
        interleaved: vec![1; 240],
    };
    assert!(overlay_additive(&mut bed, &mono, 0).is_err());
}

#[test]
fn missing_clip_leaves_slot_silent() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("present.wav");
    write_wav(&constant(500, 42), &present).unwrap();

    let clips = vec![
        clip(&dir.path().join("absent.wav"), 0.0, 0.5),
        clip(&present, 1.0, 1.5),
    ];
    let out = dir.path().join("bed.wav");
    let mix = compose_timeline(&clips, 2.0, &out).unwrap();
    assert_eq!(mix.clips_mixed, 1);
    assert_eq!(mix.clips_missing, 1);
    assert_eq!(mix.duration_secs, 2.0);

    let bed = decode_canonical(&out).unwrap();
    assert_eq!(bed.frames(), ms_to_frames(2000, CANONICAL_SAMPLE_RATE));
    let ch = usize::from(CANONICAL_CHANNELS);
    let first_half = ms_to_frames(500, CANONICAL_SAMPLE_RATE) * ch;
    assert!(bed.interleaved[..first_half].iter().all(|&s| s == 0));
    let at_1200 = ms_to_frames(1200, CANONICAL_SAMPLE_RATE) * ch;
    assert_eq!(bed.interleaved[at_1200], 42);
}

#[test]
fn clip_start_is_floored_to_milliseconds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("c.wav");
    write_wav(&constant(10, 5), &path).unwrap();

    let out = dir.path().join("bed.wav");
    compose_timeline(&[clip(&path, 0.0109, 0.02)], 0.05, &out).unwrap();
    let bed = decode_canonical(&out).unwrap();

    let ch = usize::from(CANONICAL_CHANNELS);
    let start = ms_to_frames(10, CANONICAL_SAMPLE_RATE) * ch;
    assert_eq!(bed.interleaved[start - 1], 0);
    assert_eq!(bed.interleaved[start], 5);
}

#[test]
fn corrupt_clip_aborts_mix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.wav");
    std::fs::write(&path, b"definitely not audio").unwrap();
    let out = dir.path().join("bed.wav");
    let err = compose_timeline(&[clip(&path, 0.0, 1.0)], 1.0, &out).unwrap_err();
    assert!(matches!(err, RedubError::Media(_)));
}

#[test]
fn absurd_timeline_is_rejected_before_allocating() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bed.wav");
    let clips = vec![clip(&dir.path().join("a.wav"), 0.0, 1.0e9)];

    let err = compose_timeline(&clips, 10.0, &out).unwrap_err();
    assert!(matches!(err, RedubError::Validation(_)));
    assert!(!out.exists());

    let err = compose_timeline(&[], MAX_BED_SECS + 1.0, &out).unwrap_err();
    assert!(matches!(err, RedubError::Validation(_)));
}
