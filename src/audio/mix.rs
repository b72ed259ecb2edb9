use std::path::{Path, PathBuf};

use crate::foundation::core::{RenderedClip, secs_to_ms_floor};
use crate::foundation::error::{RedubError, RedubResult};
use crate::media::pcm::{PcmBuffer, decode_canonical, ms_to_frames, write_wav};

/// Shortest bed ever produced.
const MIN_BED_SECS: f64 = 0.001;

/// Longest timeline mixed in memory: four hours.
pub const MAX_BED_SECS: f64 = 14_400.0;

#[derive(Clone, Debug, PartialEq)]
/// The exported mixdown bed.
pub struct Mixdown {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub clips_mixed: usize,
    pub clips_missing: usize,
}

/// Clips sorted by start; equal starts keep their original (job) order.
pub fn order_clips(clips: &[RenderedClip]) -> Vec<&RenderedClip> {
    let mut ordered: Vec<&RenderedClip> = clips.iter().collect();
    ordered.sort_by(|a, b| a.start.total_cmp(&b.start));
    ordered
}

/// `max(video duration, latest clip end, 1 ms)`.
pub fn total_duration_secs(video_duration_secs: f64, clips: &[RenderedClip]) -> f64 {
    clips
        .iter()
        .map(|c| c.end)
        .filter(|e| e.is_finite())
        .fold(video_duration_secs.max(MIN_BED_SECS), f64::max)
}

/// Add `clip` onto `bed` starting at `position_ms`, saturating at the 16-bit range.
///
/// Samples past the end of the bed are dropped.
pub fn overlay_additive(bed: &mut PcmBuffer, clip: &PcmBuffer, position_ms: u64) -> RedubResult<()> {
    if bed.sample_rate != clip.sample_rate || bed.channels != clip.channels {
        return Err(RedubError::validation(format!(
            "cannot overlay {}Hz/{}ch audio onto a {}Hz/{}ch bed",
            clip.sample_rate, clip.channels, bed.sample_rate, bed.channels
        )));
    }

    let offset = ms_to_frames(position_ms, bed.sample_rate) * usize::from(bed.channels);
    let Some(dst) = bed.interleaved.get_mut(offset..) else {
        return Ok(());
    };
    for (d, &s) in dst.iter_mut().zip(&clip.interleaved) {
        *d = d.saturating_add(s);
    }
    Ok(())
}

/// Mix every clip onto a silent bed and export it as a WAV file at `out_path`.
///
/// Clips whose file does not exist leave their slot silent. A clip that exists but cannot be
/// decoded aborts the mix.
#[tracing::instrument(skip_all, fields(clips = clips.len(), out = %out_path.display()))]
pub fn compose_timeline(
    clips: &[RenderedClip],
    video_duration_secs: f64,
    out_path: &Path,
) -> RedubResult<Mixdown> {
    let duration_secs = total_duration_secs(video_duration_secs, clips);
    if duration_secs > MAX_BED_SECS {
        return Err(RedubError::validation(format!(
            "timeline of {duration_secs:.3}s exceeds the {MAX_BED_SECS}s limit"
        )));
    }
    let bed_ms = (duration_secs * 1000.0).ceil() as u64;
    let mut bed = PcmBuffer::silent(bed_ms);

    let mut clips_mixed = 0usize;
    let mut clips_missing = 0usize;
    for clip in order_clips(clips) {
        if !clip.audio_path.exists() {
            tracing::debug!(
                "no audio at '{}', leaving {:.3}s..{:.3}s silent",
                clip.audio_path.display(),
                clip.start,
                clip.end
            );
            clips_missing += 1;
            continue;
        }

        let pcm = decode_canonical(&clip.audio_path).map_err(|e| {
            RedubError::media(format!(
                "failed to mix clip '{}': {e}",
                clip.audio_path.display()
            ))
        })?;
        overlay_additive(&mut bed, &pcm, secs_to_ms_floor(clip.start))?;
        clips_mixed += 1;
    }

    write_wav(&bed, out_path)?;
    tracing::info!(
        "mixed {clips_mixed} clips ({clips_missing} missing) into {duration_secs:.3}s bed"
    );

    Ok(Mixdown {
        path: out_path.to_path_buf(),
        duration_secs,
        clips_mixed,
        clips_missing,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
