use std::path::PathBuf;

use crate::foundation::error::{RedubError, RedubResult};

/// A span of narration text placed on the video timeline, in seconds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TimedSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> RedubResult<Self> {
        let seg = Self {
            start,
            end,
            text: text.into(),
        };
        seg.validate()?;
        Ok(seg)
    }

    /// Checks `0 <= start <= end` with finite bounds.
    pub fn validate(&self) -> RedubResult<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(RedubError::validation(format!(
                "segment bounds must be finite (start={}, end={})",
                self.start, self.end
            )));
        }
        if self.start < 0.0 {
            return Err(RedubError::validation(format!(
                "segment start must be >= 0 (got {})",
                self.start
            )));
        }
        if self.end < self.start {
            return Err(RedubError::validation(format!(
                "segment end must be >= start (start={}, end={})",
                self.start, self.end
            )));
        }
        Ok(())
    }

    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Same timing, new text. Segments are never edited in place.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            start: self.start,
            end: self.end,
            text: text.into(),
        }
    }
}

/// Unit of work turning one [`TimedSegment`] into one audio file.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderJob {
    pub segment: TimedSegment,
    pub instruction: Option<String>,
    pub voice: String,
    pub output_path: PathBuf,
}

/// A synthesized clip and its nominal placement on the timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedClip {
    pub audio_path: PathBuf,
    pub start: f64,
    pub end: f64,
}

impl RenderedClip {
    pub fn from_job(job: &RenderJob) -> Self {
        Self {
            audio_path: job.output_path.clone(),
            start: job.segment.start,
            end: job.segment.end,
        }
    }

    pub fn target_secs(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Everything the remux stage needs: which video, which clips, where to write.
#[derive(Clone, Debug)]
pub struct AssemblyPlan {
    pub source_video: PathBuf,
    /// Clip order is the job order; the compositor sorts by start itself.
    pub rendered_clips: Vec<RenderedClip>,
    pub output_video: PathBuf,
}

/// Whole milliseconds at or before `secs`; negative and non-finite inputs map to 0.
pub fn secs_to_ms_floor(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * 1000.0).floor() as u64
}

/// Format seconds as `HH:MM:SS.mmm`.
pub fn seconds_to_timestamp(secs: f64) -> String {
    let total_ms = secs_to_ms_floor(secs);
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
