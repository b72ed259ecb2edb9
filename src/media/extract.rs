use std::path::{Path, PathBuf};

use crate::foundation::error::{RedubError, RedubResult};
use crate::media::ffmpeg::{ensure_parent_dir, ffmpeg_command, run_tool};
use crate::media::pcm::CANONICAL_SAMPLE_RATE;
use crate::media::probe::probe_media;

/// Per-video artifact root: `<temp_dir>/<video stem>/`.
pub fn run_root_for(temp_dir: &Path, video_path: &Path) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    temp_dir.join(stem)
}

/// Extract the source audio track as 16-bit PCM WAV into `run_root`.
///
/// A video without an audio stream is an input error.
#[tracing::instrument(skip_all, fields(video = %video_path.display()))]
pub fn extract_audio(video_path: &Path, run_root: &Path) -> RedubResult<PathBuf> {
    if !video_path.is_file() {
        return Err(RedubError::input(format!(
            "source video not found: {}",
            video_path.display()
        )));
    }

    let info = probe_media(video_path)?;
    if !info.has_audio {
        return Err(RedubError::input(format!(
            "no audio track found in {}",
            video_path.display()
        )));
    }

    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    let audio_path = run_root.join(format!("{stem}.wav"));
    ensure_parent_dir(&audio_path)?;

    run_tool(
        ffmpeg_command()
            .arg("-i")
            .arg(video_path)
            .args([
                "-vn",
                "-acodec",
                "pcm_s16le",
                "-ar",
                &CANONICAL_SAMPLE_RATE.to_string(),
            ])
            .arg(&audio_path),
        &format!("audio extraction from '{}'", video_path.display()),
        RedubError::media,
    )?;

    tracing::info!("extracted audio to {}", audio_path.display());
    Ok(audio_path)
}

#[cfg(test)]
#[path = "../../tests/unit/media/extract.rs"]
mod tests;
