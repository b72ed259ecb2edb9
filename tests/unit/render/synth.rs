use super::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::foundation::core::TimedSegment;
use crate::media::pcm::{PcmBuffer, decode_canonical, write_wav};

/// Writes a short canonical clip and tracks call statistics.
#[derive(Default)]
struct FakeSpeech {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    /// Delay per call, indexed by call order, to shuffle completion order.
    delays_ms: Vec<u64>,
    fail_on: Option<String>,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, request: &SpeechRequest, dest: &Path) -> RedubResult<()> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays_ms.get(n).copied().unwrap_or(5);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_on.as_deref() == Some(request.text.as_str()) {
            return Err(RedubError::transport(Some(400), "rejected"));
        }
        write_wav(&PcmBuffer::silent(50), dest)
    }
}

fn job(dir: &Path, index: usize, start: f64, end: f64, text: &str) -> RenderJob {
    RenderJob {
        segment: TimedSegment::new(start, end, text).unwrap(),
        instruction: Some("calm".to_string()),
        voice: "alloy".to_string(),
        output_path: dir.join(format!("{index:04}.wav")),
    }
}

fn five_jobs(dir: &Path) -> Vec<RenderJob> {
    (0..5)
        .map(|i| job(dir, i, i as f64, i as f64 + 1.0, &format!("line {i}")))
        .collect()
}

#[tokio::test]
async fn rerun_over_existing_outputs_makes_no_calls() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = five_jobs(dir.path());

    let first = Arc::new(FakeSpeech::default());
    synthesize_all(&jobs, 3, first.clone(), 1.3).await.unwrap();
    assert_eq!(first.calls.load(Ordering::SeqCst), 5);

    let second = Arc::new(FakeSpeech::default());
    let clips = synthesize_all(&jobs, 3, second.clone(), 1.3).await.unwrap();
    assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    assert_eq!(clips.len(), 5);
}

#[tokio::test]
async fn empty_output_file_is_rendered_again() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = vec![job(dir.path(), 0, 0.0, 1.0, "hello")];
    std::fs::write(&jobs[0].output_path, b"").unwrap();

    let speech = Arc::new(FakeSpeech::default());
    synthesize_all(&jobs, 1, speech.clone(), 1.3).await.unwrap();
    assert_eq!(speech.calls.load(Ordering::SeqCst), 1);
    assert!(has_existing_render(&jobs[0].output_path));
}

#[tokio::test]
async fn blank_text_renders_silence_without_calls() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = vec![
        job(dir.path(), 0, 1.0, 2.5, "   "),
        job(dir.path(), 1, 3.0, 3.0, ""),
    ];

    let speech = Arc::new(FakeSpeech::default());
    let clips = synthesize_all(&jobs, 2, speech.clone(), 1.3).await.unwrap();
    assert_eq!(speech.calls.load(Ordering::SeqCst), 0);

    let first = decode_canonical(&clips[0].audio_path).unwrap();
    assert_eq!(first.frames(), 66_150);
    assert!(first.interleaved.iter().all(|&s| s == 0));

    // Zero-length slots still get 1 ms of audio.
    let second = decode_canonical(&clips[1].audio_path).unwrap();
    assert_eq!(second.frames(), 44);
}

#[tokio::test]
async fn concurrency_is_bounded_and_order_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = five_jobs(dir.path());

    let speech = Arc::new(FakeSpeech {
        delays_ms: vec![40, 5, 30, 1, 10],
        ..FakeSpeech::default()
    });
    let clips = synthesize_all(&jobs, 2, speech.clone(), 1.3).await.unwrap();

    assert_eq!(speech.calls.load(Ordering::SeqCst), 5);
    assert!(speech.peak.load(Ordering::SeqCst) <= 2);

    let expected: Vec<PathBuf> = jobs.iter().map(|j| j.output_path.clone()).collect();
    let got: Vec<PathBuf> = clips.iter().map(|c| c.audio_path.clone()).collect();
    assert_eq!(got, expected);
    for (clip, job) in clips.iter().zip(&jobs) {
        assert_eq!(clip.start, job.segment.start);
        assert_eq!(clip.end, job.segment.end);
    }
}

#[tokio::test]
async fn failure_lets_admitted_jobs_finish_and_starts_no_queued_ones() {
    let dir = tempfile::tempdir().unwrap();
    let mut jobs = five_jobs(dir.path());
    jobs[1].segment = jobs[1].segment.with_text("bad line");

    // Job 0 is still running when job 1 fails.
    let speech = Arc::new(FakeSpeech {
        delays_ms: vec![50, 5],
        fail_on: Some("bad line".to_string()),
        ..FakeSpeech::default()
    });
    let err = synthesize_all(&jobs, 2, speech.clone(), 1.3)
        .await
        .unwrap_err();

    assert!(matches!(err, RedubError::Transport { status: Some(400), .. }));
    assert_eq!(speech.calls.load(Ordering::SeqCst), 2);
    assert!(jobs[0].output_path.exists());
    for j in &jobs[1..] {
        assert!(!j.output_path.exists());
    }
}

#[tokio::test]
async fn rejected_first_job_stops_the_queue() {
    let dir = tempfile::tempdir().unwrap();
    let mut jobs: Vec<RenderJob> = (0..20)
        .map(|i| job(dir.path(), i, i as f64, i as f64 + 1.0, &format!("line {i}")))
        .collect();
    jobs[0].segment = jobs[0].segment.with_text("bad line");

    let speech = Arc::new(FakeSpeech {
        fail_on: Some("bad line".to_string()),
        ..FakeSpeech::default()
    });
    let err = synthesize_all(&jobs, 1, speech.clone(), 1.3)
        .await
        .unwrap_err();

    assert!(matches!(err, RedubError::Transport { status: Some(400), .. }));
    assert_eq!(speech.calls.load(Ordering::SeqCst), 1);
    assert!(jobs.iter().all(|j| !j.output_path.exists()));
}

#[tokio::test]
async fn zero_limit_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = synthesize_all(&five_jobs(dir.path()), 0, Arc::new(FakeSpeech::default()), 1.3)
        .await
        .unwrap_err();
    assert!(matches!(err, RedubError::Validation(_)));
}

#[test]
fn silence_length_follows_slot() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(silence_ms_for(&job(dir.path(), 0, 1.0, 2.5, "")), 1500);
    assert_eq!(silence_ms_for(&job(dir.path(), 0, 2.0, 2.0, "")), 1);
}
