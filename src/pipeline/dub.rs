//! End-to-end dubbing: transcript, translation, synthesis, compositing and remux.

use std::path::{Path, PathBuf};

use crate::audio::mix::compose_timeline;
use crate::config::settings::Settings;
use crate::encode::remux::replace_audio_track;
use crate::foundation::core::{AssemblyPlan, TimedSegment, seconds_to_timestamp};
use crate::foundation::error::{RedubError, RedubResult};
use crate::media::extract::{extract_audio, run_root_for};
use crate::media::probe::probe_duration_or_zero;
use crate::providers::Providers;
use crate::render::jobs::build_render_jobs;
use crate::render::synth::synthesize_all;
use crate::transcript::cache::TranscriptStore;
use crate::transcript::normalize::parse_transcript_json;

/// Run `f` on tokio's blocking pool.
async fn blocking<T, F>(what: &'static str, f: F) -> RedubResult<T>
where
    F: FnOnce() -> RedubResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RedubError::media(format!("{what} task failed: {e}")))?
}

/// Default output path: `<dir>/<stem>.dubbed.<ext>` next to the source.
pub fn default_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    source.with_file_name(format!("{stem}.dubbed.{ext}"))
}

/// Composite `plan`'s clips over the source duration and remux them onto its picture.
///
/// The temporary bed lives at `<output>.temp.wav` and is removed by the remux stage.
#[tracing::instrument(skip_all, fields(clips = plan.rendered_clips.len()))]
pub async fn assemble(plan: AssemblyPlan, bitrate_kbps: u32) -> RedubResult<PathBuf> {
    blocking("assembly", move || {
        let video_duration = probe_duration_or_zero(&plan.source_video);
        let bed_path = plan.output_video.with_extension("temp.wav");
        let mixdown = match compose_timeline(&plan.rendered_clips, video_duration, &bed_path) {
            Ok(m) => m,
            Err(e) => {
                let _ = std::fs::remove_file(&bed_path);
                return Err(e);
            }
        };
        tracing::info!(
            "audio bed spans {} (video {})",
            seconds_to_timestamp(mixdown.duration_secs),
            seconds_to_timestamp(video_duration)
        );
        replace_audio_track(
            &plan.source_video,
            &mixdown.path,
            &plan.output_video,
            bitrate_kbps,
        )
    })
    .await
}

/// Coordinates one video's dubbing run.
pub struct DubbingPipeline {
    settings: Settings,
    providers: Providers,
    transcripts: TranscriptStore,
}

impl DubbingPipeline {
    pub fn new(settings: Settings, providers: Providers) -> RedubResult<Self> {
        settings.validate()?;
        let transcripts = TranscriptStore::new(settings.temp_dir.join("transcripts"));
        Ok(Self {
            settings,
            providers,
            transcripts,
        })
    }

    pub fn with_transcript_store(mut self, store: TranscriptStore) -> Self {
        self.transcripts = store;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn run_root(&self, source: &Path) -> PathBuf {
        run_root_for(&self.settings.temp_dir, source)
    }

    /// Dub `source` from scratch: extract, transcribe (or load `transcript`), translate, render.
    #[tracing::instrument(skip_all, fields(source = %source.display()))]
    pub async fn run(
        &self,
        source: &Path,
        output: &Path,
        transcript: Option<&Path>,
    ) -> RedubResult<PathBuf> {
        if !source.is_file() {
            return Err(RedubError::input(format!(
                "source video not found: {}",
                source.display()
            )));
        }

        let segments = match transcript {
            Some(path) => load_transcript_file(path).await?,
            None => self.transcribe_source(source).await?,
        };
        if segments.is_empty() {
            tracing::warn!("no speech segments found; output will carry a silent track");
        }

        let segments = match self.settings.target_language.as_deref().map(str::trim) {
            Some(lang) if !lang.is_empty() => {
                tracing::info!("translating {} segments to {lang}", segments.len());
                self.providers.translator.translate(&segments, lang).await?
            }
            _ => segments,
        };

        self.dub_video(source, &segments, output).await
    }

    async fn transcribe_source(&self, source: &Path) -> RedubResult<Vec<TimedSegment>> {
        let run_root = self.run_root(source);
        let video = source.to_path_buf();
        let audio = blocking("audio extraction", move || extract_audio(&video, &run_root)).await?;

        if let Some(cached) = self.transcripts.load(&audio) {
            return Ok(cached);
        }
        let segments = self.providers.transcriber.transcribe(&audio).await?;
        self.transcripts.store(&audio, &segments);
        Ok(segments)
    }

    /// Replace the narration of `source` with speech rendered from `segments`.
    #[tracing::instrument(skip_all, fields(source = %source.display(), segments = segments.len()))]
    pub async fn dub_video(
        &self,
        source: &Path,
        segments: &[TimedSegment],
        output: &Path,
    ) -> RedubResult<PathBuf> {
        if !source.is_file() {
            return Err(RedubError::input(format!(
                "source video not found: {}",
                source.display()
            )));
        }
        for seg in segments {
            seg.validate()?;
        }

        let run_root = self.run_root(source);
        let jobs = build_render_jobs(
            segments,
            &run_root.join("tts"),
            self.settings.tts_instruction.as_deref(),
            self.settings.tts_instruction_override.as_deref(),
            &self.settings.tts_voice,
            Some(run_root.as_path()),
        )?;

        let rendered_clips = synthesize_all(
            &jobs,
            self.settings.max_concurrency,
            self.providers.speech.clone(),
            self.settings.max_speedup,
        )
        .await?;

        let plan = AssemblyPlan {
            source_video: source.to_path_buf(),
            rendered_clips,
            output_video: output.to_path_buf(),
        };
        assemble(plan, self.settings.audio_bitrate_kbps).await
    }
}

/// Load a prepared transcript JSON file.
pub async fn load_transcript_file(path: &Path) -> RedubResult<Vec<TimedSegment>> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        RedubError::input(format!("transcript file '{}' unreadable: {e}", path.display()))
    })?;
    let segments = parse_transcript_json(&text)?;
    tracing::info!("loaded {} segments from {}", segments.len(), path.display());
    Ok(segments)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/dub.rs"]
mod tests;
