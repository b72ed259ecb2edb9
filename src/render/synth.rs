//! Bounded synthesizer: runs speech synthesis for every job with at most `limit` in flight.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::audio::fit::{FitOutcome, fit_clip_in_background};
use crate::foundation::core::{RenderJob, RenderedClip, secs_to_ms_floor};
use crate::foundation::error::{RedubError, RedubResult};
use crate::media::pcm::write_silence_wav;
use crate::providers::{SpeechRequest, SpeechSynthesizer};

#[derive(Clone, Debug, PartialEq)]
/// What happened to a single job.
pub enum JobStatus {
    /// A non-empty output already existed.
    Reused,
    /// Blank text, rendered as silence.
    Silence,
    /// Rendered by the speech backend, then fitted.
    Synthesized(FitOutcome),
}

/// `true` when `path` holds a previous, non-empty render.
pub fn has_existing_render(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// Silence length for a blank segment: its slot, but at least 1 ms.
pub fn silence_ms_for(job: &RenderJob) -> u64 {
    secs_to_ms_floor(job.segment.end - job.segment.start).max(1)
}

/// Render a single job into its output path.
#[tracing::instrument(skip_all, fields(out = %job.output_path.display()))]
pub async fn render_job(
    job: &RenderJob,
    speech: &dyn SpeechSynthesizer,
    max_speedup: f64,
) -> RedubResult<JobStatus> {
    if has_existing_render(&job.output_path) {
        tracing::debug!("reusing existing render");
        return Ok(JobStatus::Reused);
    }

    if let Some(parent) = job.output_path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            RedubError::input(format!(
                "failed to create render directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let text = job.segment.text.trim();
    if text.is_empty() {
        let path = job.output_path.clone();
        let ms = silence_ms_for(job);
        tokio::task::spawn_blocking(move || write_silence_wav(&path, ms))
            .await
            .map_err(|e| RedubError::media(format!("silence writer task failed: {e}")))??;
        return Ok(JobStatus::Silence);
    }

    let request = SpeechRequest {
        text: text.to_string(),
        voice: job.voice.clone(),
        instruction: job.instruction.clone(),
    };
    speech.synthesize(&request, &job.output_path).await?;

    let outcome = fit_clip_in_background(
        job.output_path.clone(),
        job.segment.duration_secs(),
        max_speedup,
    )
    .await;
    Ok(JobStatus::Synthesized(outcome))
}

/// Render every job with at most `limit` synthesis calls in flight.
///
/// The first failure closes the gate: jobs still waiting for a slot are never started, while jobs
/// already admitted run to completion before this returns. Clips come back in job order no matter
/// which job finished first, and the first failure in job order is the one reported.
#[tracing::instrument(skip_all, fields(jobs = jobs.len(), limit = limit))]
pub async fn synthesize_all(
    jobs: &[RenderJob],
    limit: usize,
    speech: Arc<dyn SpeechSynthesizer>,
    max_speedup: f64,
) -> RedubResult<Vec<RenderedClip>> {
    if limit == 0 {
        return Err(RedubError::validation("synthesis concurrency limit must be >= 1"));
    }

    let gate = Arc::new(Semaphore::new(limit));
    let mut handles = Vec::with_capacity(jobs.len());
    for job in jobs.iter().cloned() {
        let gate = gate.clone();
        let speech = speech.clone();
        handles.push(tokio::spawn(async move {
            // A closed gate means an earlier job already failed.
            let Ok(_permit) = gate.clone().acquire_owned().await else {
                return Ok(None);
            };
            let result = render_job(&job, speech.as_ref(), max_speedup).await;
            if result.is_err() {
                gate.close();
            }
            result.map(Some)
        }));
    }

    let mut slots: Vec<RedubResult<Option<JobStatus>>> = Vec::with_capacity(jobs.len());
    for handle in handles {
        slots.push(match handle.await {
            Ok(result) => result,
            Err(e) => Err(RedubError::media(format!("synthesis task failed: {e}"))),
        });
    }

    let skipped = slots.iter().filter(|s| matches!(s, Ok(None))).count();
    if let Some((job, Err(e))) = jobs.iter().zip(slots.iter()).find(|(_, s)| s.is_err()) {
        tracing::error!(
            "render of '{}' failed: {e}; {skipped} queued jobs were not started",
            job.output_path.display()
        );
    }
    let statuses = slots.into_iter().collect::<RedubResult<Vec<_>>>()?;

    let mut clips = Vec::with_capacity(jobs.len());
    let (mut reused, mut silent, mut compressed, mut degraded) = (0usize, 0usize, 0usize, 0usize);
    for (job, status) in jobs.iter().zip(statuses) {
        let status = status
            .ok_or_else(|| RedubError::validation("synthesis job skipped without a failure"))?;
        match status {
            JobStatus::Reused => reused += 1,
            JobStatus::Silence => silent += 1,
            JobStatus::Synthesized(FitOutcome::Compressed { .. }) => compressed += 1,
            JobStatus::Synthesized(FitOutcome::Degraded { .. }) => degraded += 1,
            JobStatus::Synthesized(FitOutcome::Unchanged) => {}
        }
        clips.push(RenderedClip::from_job(job));
    }

    tracing::info!(
        "rendered {} clips ({reused} reused, {silent} silent, {compressed} compressed, {degraded} unfitted)",
        clips.len()
    );
    Ok(clips)
}

#[cfg(test)]
#[path = "../../tests/unit/render/synth.rs"]
mod tests;
