#![forbid(unsafe_code)]

//! Re-time synthesized narration onto an existing video.
//!
//! Timed text segments become render jobs, jobs are synthesized under a concurrency bound and
//! fitted to their slots, the clips are mixed onto a full-length bed, and the bed replaces the
//! source video's audio track without re-encoding the picture.

pub mod audio;
pub mod config;
pub mod encode;
pub mod foundation;
pub mod media;
pub mod pipeline;
pub mod providers;
pub mod render;
pub mod transcript;

pub use audio::fit::{FitOutcome, fit_clip_duration, plan_speedup};
pub use audio::mix::{Mixdown, compose_timeline};
pub use config::settings::Settings;
pub use encode::remux::replace_audio_track;
pub use foundation::core::{AssemblyPlan, RenderJob, RenderedClip, TimedSegment, seconds_to_timestamp};
pub use foundation::error::{RedubError, RedubResult};
pub use pipeline::dub::{DubbingPipeline, assemble, default_output_path};
pub use providers::openai::OpenAiClient;
pub use providers::{Providers, SpeechRequest, SpeechSynthesizer, Transcriber, Translator};
pub use render::jobs::build_render_jobs;
pub use render::synth::synthesize_all;
pub use transcript::cache::TranscriptStore;
