//! Runtime configuration for the dubbing pipeline.
//!
//! Settings come from defaults, then the process environment, then CLI flags (applied by the
//! binary on top of [`Settings::from_env`]).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{RedubError, RedubResult};

/// Default ceiling for duration-fitting speed-up.
pub const DEFAULT_MAX_SPEEDUP: f64 = 1.3;

/// Default AAC bitrate of the remuxed audio track.
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 192;

/// Root settings structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Provider API key. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    #[serde(default = "default_translation_model")]
    pub translation_model: String,

    /// Extra guidance appended to the translation system prompt.
    #[serde(default)]
    pub translation_instruction: Option<String>,

    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,

    /// Configured default narration instruction.
    #[serde(default)]
    pub tts_instruction: Option<String>,

    /// Per-run override of the narration instruction.
    #[serde(default)]
    pub tts_instruction_override: Option<String>,

    /// Language to translate segments into before synthesis. `None` keeps the source text.
    #[serde(default)]
    pub target_language: Option<String>,

    /// Maximum number of synthesis calls in flight.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Ceiling for duration-fitting speed-up.
    #[serde(default = "default_max_speedup")]
    pub max_speedup: f64,

    #[serde(default = "default_audio_bitrate_kbps")]
    pub audio_bitrate_kbps: u32,

    /// Root folder for per-run artifacts.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            transcription_model: default_transcription_model(),
            translation_model: default_translation_model(),
            translation_instruction: None,
            tts_model: default_tts_model(),
            tts_voice: default_tts_voice(),
            tts_instruction: None,
            tts_instruction_override: None,
            target_language: None,
            max_concurrency: default_max_concurrency(),
            max_speedup: default_max_speedup(),
            audio_bitrate_kbps: default_audio_bitrate_kbps(),
            temp_dir: default_temp_dir(),
        }
    }
}

impl Settings {
    /// Build settings from the process environment on top of defaults.
    pub fn from_env() -> RedubResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RedubResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut s = Self::default();

        if let Some(v) = get("OPENAI_API_KEY") {
            s.api_key = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            s.api_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("TRANSLATION_MODEL") {
            s.translation_model = v;
        }
        s.translation_instruction = get("TRANSLATION_INSTRUCTION");
        if let Some(v) = get("TTS_VOICE") {
            s.tts_voice = v;
        }
        s.tts_instruction = get("TTS_INSTRUCTION");
        s.target_language = get("TARGET_LANGUAGE");
        if let Some(v) = get("MAX_CONCURRENCY") {
            s.max_concurrency = v.trim().parse().map_err(|e| {
                RedubError::validation(format!("MAX_CONCURRENCY must be an integer ('{v}'): {e}"))
            })?;
        }
        if let Some(v) = get("MAX_SPEEDUP") {
            s.max_speedup = v.trim().parse().map_err(|e| {
                RedubError::validation(format!("MAX_SPEEDUP must be a number ('{v}'): {e}"))
            })?;
        }
        if let Some(v) = get("TEMP_DIR") {
            s.temp_dir = PathBuf::from(v);
        }

        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> RedubResult<()> {
        if self.max_concurrency == 0 {
            return Err(RedubError::validation("max_concurrency must be >= 1"));
        }
        if !self.max_speedup.is_finite() || self.max_speedup < 1.0 {
            return Err(RedubError::validation(format!(
                "max_speedup must be a finite number >= 1.0 (got {})",
                self.max_speedup
            )));
        }
        if self.audio_bitrate_kbps == 0 {
            return Err(RedubError::validation("audio_bitrate_kbps must be > 0"));
        }
        Ok(())
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_transcription_model() -> String {
    "gpt-4o-transcribe".to_string()
}

fn default_translation_model() -> String {
    "gpt-4o".to_string()
}

fn default_tts_model() -> String {
    "gpt-4o-mini-tts".to_string()
}

fn default_tts_voice() -> String {
    "alloy".to_string()
}

fn default_max_concurrency() -> usize {
    10
}

fn default_max_speedup() -> f64 {
    DEFAULT_MAX_SPEEDUP
}

fn default_audio_bitrate_kbps() -> u32 {
    DEFAULT_AUDIO_BITRATE_KBPS
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

#[cfg(test)]
#[path = "../../tests/unit/config/settings.rs"]
mod tests;
