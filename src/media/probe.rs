use std::path::{Path, PathBuf};
use std::process::Command;

use crate::foundation::error::{RedubError, RedubResult};
use crate::media::ffmpeg::run_tool;

#[derive(Clone, Debug, PartialEq)]
/// Container-level facts about a media file.
pub struct MediaInfo {
    pub path: PathBuf,
    /// Container duration; `None` when ffprobe reports none or an unparsable value.
    pub duration_secs: Option<f64>,
    pub has_video: bool,
    pub has_audio: bool,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Probe container metadata through `ffprobe`.
pub fn probe_media(path: &Path) -> RedubResult<MediaInfo> {
    let stdout = run_tool(
        Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path),
        &format!("probe of '{}'", path.display()),
        RedubError::media,
    )?;
    parse_probe_json(path, &stdout)
}

pub(crate) fn parse_probe_json(path: &Path, json: &[u8]) -> RedubResult<MediaInfo> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| RedubError::serde(format!("ffprobe json parse failed: {e}")))?;

    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite())
        .map(|d| d.max(0.0));
    let has_kind = |kind: &str| {
        parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some(kind))
    };

    Ok(MediaInfo {
        path: path.to_path_buf(),
        duration_secs,
        has_video: has_kind("video"),
        has_audio: has_kind("audio"),
    })
}

/// Measured duration of a media file in seconds.
pub fn probe_duration_secs(path: &Path) -> RedubResult<f64> {
    probe_media(path)?.duration_secs.ok_or_else(|| {
        RedubError::media(format!("ffprobe reported no duration for '{}'", path.display()))
    })
}

/// Duration of a source video, with any probe failure treated as zero.
pub fn probe_duration_or_zero(path: &Path) -> f64 {
    match probe_duration_secs(path) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("treating duration of '{}' as 0: {e}", path.display());
            0.0
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
