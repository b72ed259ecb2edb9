//! Duration fitting: clamped, pitch-preserving time compression of a synthesized clip.
//!
//! A clip longer than its slot is sped up by `actual / target`, but never beyond the configured
//! ceiling. Anything above the ceiling is accepted as overrun and spills into the following slot
//! during mixing. Fitting never fails the pipeline: tool or decode problems are reported as
//! [`FitOutcome::Degraded`] and the clip is left as it was.

use std::path::{Path, PathBuf};

use crate::foundation::error::{RedubError, RedubResult};
use crate::media::ffmpeg::{ffmpeg_command, run_tool};
use crate::media::probe::probe_duration_secs;

/// Speed-ups at or below this factor are not worth a re-encode.
pub const MIN_WORTHWHILE_SPEEDUP: f64 = 1.01;

/// Largest tempo change a single `atempo` stage accepts on older ffmpeg builds.
const ATEMPO_STAGE_MAX: f64 = 2.0;

#[derive(Clone, Debug, PartialEq)]
/// Result of fitting one clip.
pub enum FitOutcome {
    /// Clip already fits, or the needed speed-up is negligible.
    Unchanged,
    /// Clip was compressed in place.
    Compressed {
        /// Applied speed-up.
        factor: f64,
        /// Seconds the compressed clip still runs past its slot (0 when it fits).
        residual_overrun_secs: f64,
    },
    /// Measuring or compressing failed; the clip was left unmodified.
    Degraded {
        /// What went wrong.
        reason: String,
    },
}

/// Speed-up to apply to a clip of `actual_secs` placed in a `target_secs` slot.
///
/// Returns `None` when no adjustment should happen.
pub fn plan_speedup(actual_secs: f64, target_secs: f64, max_speedup: f64) -> Option<f64> {
    if !actual_secs.is_finite() || actual_secs <= target_secs {
        return None;
    }
    let factor = if target_secs > 0.0 {
        actual_secs / target_secs
    } else {
        f64::INFINITY
    };
    let effective = factor.min(max_speedup);
    (effective > MIN_WORTHWHILE_SPEEDUP).then_some(effective)
}

/// `atempo` filter graph for `factor`, split into stages no larger than 2.0.
pub fn atempo_filter(factor: f64) -> String {
    let mut stages = Vec::new();
    let mut remaining = factor;
    while remaining > ATEMPO_STAGE_MAX {
        stages.push(format!("atempo={ATEMPO_STAGE_MAX:.1}"));
        remaining /= ATEMPO_STAGE_MAX;
    }
    stages.push(format!("atempo={remaining:.6}"));
    stages.join(",")
}

/// Measure a clip's duration: WAV headers are read directly, anything else goes through ffprobe.
pub fn measure_duration_secs(path: &Path) -> RedubResult<f64> {
    if let Ok(reader) = hound::WavReader::open(path) {
        let spec = reader.spec();
        if spec.sample_rate > 0 {
            return Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate));
        }
    }
    probe_duration_secs(path)
}

/// Fit the clip at `path` into `target_secs`, rewriting it in place when compressed.
///
/// Blocking: shells out to ffprobe/ffmpeg. Use [`fit_clip_in_background`] from async code.
#[tracing::instrument(skip_all, fields(clip = %path.display()))]
pub fn fit_clip_duration(path: &Path, target_secs: f64, max_speedup: f64) -> FitOutcome {
    let actual = match measure_duration_secs(path) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("skipping duration fit, could not measure clip: {e}");
            return FitOutcome::Degraded {
                reason: e.to_string(),
            };
        }
    };

    let Some(factor) = plan_speedup(actual, target_secs, max_speedup) else {
        return FitOutcome::Unchanged;
    };

    if let Err(e) = compress_in_place(path, factor) {
        tracing::warn!("keeping overlong clip ({actual:.3}s for a {target_secs:.3}s slot): {e}");
        return FitOutcome::Degraded {
            reason: e.to_string(),
        };
    }

    let residual_overrun_secs = (actual / factor - target_secs).max(0.0);
    if residual_overrun_secs > 0.0 {
        tracing::debug!(
            "clip compressed by {factor:.4} still overruns its slot by {residual_overrun_secs:.3}s"
        );
    }
    FitOutcome::Compressed {
        factor,
        residual_overrun_secs,
    }
}

/// [`fit_clip_duration`] on tokio's blocking pool.
pub async fn fit_clip_in_background(path: PathBuf, target_secs: f64, max_speedup: f64) -> FitOutcome {
    match tokio::task::spawn_blocking(move || fit_clip_duration(&path, target_secs, max_speedup))
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("duration fit task failed: {e}");
            FitOutcome::Degraded {
                reason: format!("duration fit task failed: {e}"),
            }
        }
    }
}

fn compress_in_place(path: &Path, factor: f64) -> RedubResult<()> {
    let tmp = path.with_extension("fit.tmp.wav");
    let result = run_tool(
        ffmpeg_command()
            .arg("-i")
            .arg(path)
            .args(["-filter:a", &atempo_filter(factor), "-acodec", "pcm_s16le"])
            .arg(&tmp),
        &format!("time compression of '{}'", path.display()),
        RedubError::media,
    )
    .and_then(|_| {
        std::fs::rename(&tmp, path).map_err(|e| {
            RedubError::media(format!(
                "failed to replace '{}' with compressed clip: {e}",
                path.display()
            ))
        })
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
#[path = "../../tests/unit/audio/fit.rs"]
mod tests;
