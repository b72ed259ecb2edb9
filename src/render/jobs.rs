//! Render job builder: one job per segment, with stable and collision-free output paths.

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{RenderJob, TimedSegment};
use crate::foundation::error::RedubResult;
use crate::foundation::snapshot::save_snapshot;

/// Narration instruction used when neither an override nor a configured default is set.
pub const BASELINE_INSTRUCTION: &str = "Speak naturally and clearly at a steady, conversational \
pace, matching the tone of the original narration.";

/// File name for the job at `index` starting at `start_secs`.
///
/// Zero-padded index first, so names sort in segment order and never collide.
pub fn job_file_name(index: usize, start_secs: f64) -> String {
    format!("{index:04}_{start_secs:08.3}.wav")
}

/// Instruction sent with every speech request.
pub fn effective_instruction(default: Option<&str>, override_instruction: Option<&str>) -> String {
    let non_blank = |s: &&str| !s.trim().is_empty();
    override_instruction
        .map(str::trim)
        .filter(non_blank)
        .or_else(|| default.map(str::trim).filter(non_blank))
        .unwrap_or(BASELINE_INSTRUCTION)
        .to_string()
}

/// Turn `segments` into render jobs writing into `out_dir`.
///
/// Creates `out_dir` and, when `snapshot_root` is set, records the instruction that will be sent
/// downstream. Nothing is synthesized here.
#[tracing::instrument(skip_all, fields(segments = segments.len(), out_dir = %out_dir.display()))]
pub fn build_render_jobs(
    segments: &[TimedSegment],
    out_dir: &Path,
    default_instruction: Option<&str>,
    override_instruction: Option<&str>,
    voice: &str,
    snapshot_root: Option<&Path>,
) -> RedubResult<Vec<RenderJob>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create render directory '{}'", out_dir.display()))?;

    let instruction = effective_instruction(default_instruction, override_instruction);
    save_snapshot(snapshot_root, "tts", "instruction", &instruction, "txt");

    let jobs: Vec<RenderJob> = segments
        .iter()
        .enumerate()
        .map(|(index, segment)| RenderJob {
            segment: segment.clone(),
            instruction: Some(instruction.clone()),
            voice: voice.to_string(),
            output_path: out_dir.join(job_file_name(index, segment.start)),
        })
        .collect();

    tracing::debug!("prepared {} render jobs", jobs.len());
    Ok(jobs)
}

#[cfg(test)]
#[path = "../../tests/unit/render/jobs.rs"]
mod tests;
