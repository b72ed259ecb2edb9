//! Audio-track replacement via ffmpeg stream copy.
//!
//! The picture stream is never re-encoded: audio is stripped with `-c copy -an`, then the muted
//! video is combined with the new bed, copying video and encoding audio to AAC.

use std::path::{Path, PathBuf};

use crate::foundation::error::{RedubError, RedubResult};
use crate::media::ffmpeg::{ensure_parent_dir, ffmpeg_command, run_tool};

/// Removes an intermediate file when dropped, unless it is the final output.
struct TempFileGuard {
    path: Option<PathBuf>,
}

impl TempFileGuard {
    fn new(path: &Path, output: &Path) -> Self {
        Self {
            path: (path != output).then(|| path.to_path_buf()),
        }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take()
            && path.exists()
            && let Err(e) = std::fs::remove_file(&path)
        {
            tracing::warn!("failed to remove temporary '{}': {e}", path.display());
        }
    }
}

/// `<dir>/<stem>.muted.<ext>` next to `source`.
pub fn muted_path_for(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let name = match source.extension() {
        Some(ext) => format!("{stem}.muted.{}", ext.to_string_lossy()),
        None => format!("{stem}.muted"),
    };
    source.with_file_name(name)
}

/// Stream-copy `source` without its audio tracks into [`muted_path_for`].
pub fn strip_audio(source: &Path) -> RedubResult<PathBuf> {
    if !source.is_file() {
        return Err(RedubError::input(format!(
            "source video not found: {}",
            source.display()
        )));
    }
    let muted = muted_path_for(source);
    run_tool(
        ffmpeg_command()
            .arg("-i")
            .arg(source)
            .args(["-c", "copy", "-an"])
            .arg(&muted),
        &format!("audio strip of '{}'", source.display()),
        RedubError::remux,
    )?;
    Ok(muted)
}

/// Combine the picture of `video` with `audio`, encoding only the audio.
pub fn mux_audio(video: &Path, audio: &Path, output: &Path, bitrate_kbps: u32) -> RedubResult<()> {
    if bitrate_kbps == 0 {
        return Err(RedubError::validation("audio bitrate must be > 0"));
    }
    ensure_parent_dir(output)?;
    run_tool(
        ffmpeg_command()
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args([
                "-map",
                "0:v",
                "-map",
                "1:a:0",
                "-c:v",
                "copy",
                "-c:a",
                "aac",
                "-b:a",
                &format!("{bitrate_kbps}k"),
            ])
            .arg(output),
        &format!("mux into '{}'", output.display()),
        RedubError::remux,
    )?;
    Ok(())
}

/// Replace the audio of `source` with `audio_bed`, writing `output`.
///
/// The muted intermediate and `audio_bed` are removed whether or not the remux succeeds, except
/// when either one is the output path itself. A failed remux leaves no output behind.
#[tracing::instrument(skip_all, fields(source = %source.display(), output = %output.display()))]
pub fn replace_audio_track(
    source: &Path,
    audio_bed: &Path,
    output: &Path,
    bitrate_kbps: u32,
) -> RedubResult<PathBuf> {
    let _bed_guard = TempFileGuard::new(audio_bed, output);
    if !audio_bed.is_file() {
        return Err(RedubError::input(format!(
            "audio bed not found: {}",
            audio_bed.display()
        )));
    }

    // Also covers a partial file left by a failed strip.
    let _muted_guard = TempFileGuard::new(&muted_path_for(source), output);
    let muted = strip_audio(source)?;

    if let Err(e) = mux_audio(&muted, audio_bed, output, bitrate_kbps) {
        if output != muted && output != audio_bed && output.exists() {
            let _ = std::fs::remove_file(output);
        }
        return Err(e);
    }

    tracing::info!("wrote {}", output.display());
    Ok(output.to_path_buf())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/remux.rs"]
mod tests;
