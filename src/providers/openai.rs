//! OpenAI-compatible HTTP implementation of the provider traits.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt as _;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio::io::AsyncWriteExt as _;

use crate::audio::fit::measure_duration_secs;
use crate::config::settings::Settings;
use crate::foundation::core::TimedSegment;
use crate::foundation::error::{RedubError, RedubResult};
use crate::foundation::snapshot::save_snapshot;
use crate::providers::reply::{apply_translations, parse_translation_reply};
use crate::providers::retry::{RetryPolicy, retry_transient};
use crate::providers::{SpeechRequest, SpeechSynthesizer, Transcriber, Translator};
use crate::transcript::normalize::{RawTranscript, segments_from_transcript};

const TRANSLATION_SYSTEM_PROMPT: &str = "You translate text snippets into the requested language. \
Return a JSON array of objects with keys 'index' and 'translation', preserving the order of the \
provided segments and avoiding additional commentary.";

#[derive(Clone, Debug)]
/// Client for transcription, translation and speech endpoints.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    transcription_model: String,
    translation_model: String,
    translation_instruction: Option<String>,
    tts_model: String,
    retry: RetryPolicy,
    snapshot_root: Option<PathBuf>,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> RedubResult<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(RedubError::validation(
                "an API key is required (set OPENAI_API_KEY)",
            ));
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("redub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RedubError::transport(None, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            transcription_model: settings.transcription_model.clone(),
            translation_model: settings.translation_model.clone(),
            translation_instruction: settings.translation_instruction.clone(),
            tts_model: settings.tts_model.clone(),
            retry: RetryPolicy::default(),
            snapshot_root: Some(settings.temp_dir.clone()),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Where translation request snapshots go; `None` disables them.
    pub fn with_snapshot_root(mut self, root: Option<PathBuf>) -> Self {
        self.snapshot_root = root;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> RedubResult<reqwest::Response> {
        let resp = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp).await
    }
}

/// `response_format` the transcription endpoint accepts for `model`.
pub fn transcription_response_format(model: &str) -> &'static str {
    if model.to_lowercase().contains("gpt-4o-transcribe") {
        "json"
    } else {
        "verbose_json"
    }
}

fn transport_error(e: reqwest::Error) -> RedubError {
    RedubError::transport(e.status().map(|s| s.as_u16()), e.to_string())
}

async fn check_status(resp: reqwest::Response) -> RedubResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RedubError::transport(
        Some(status.as_u16()),
        format!("{status}: {}", body.trim()),
    ))
}

#[async_trait]
impl SpeechSynthesizer for OpenAiClient {
    async fn synthesize(&self, request: &SpeechRequest, dest: &Path) -> RedubResult<()> {
        let mut body = serde_json::json!({
            "model": self.tts_model,
            "voice": request.voice,
            "input": request.text,
            "response_format": "wav",
        });
        if let Some(instruction) = &request.instruction {
            body["instructions"] = serde_json::Value::String(instruction.clone());
        }

        let partial = partial_path_for(dest);
        let (body, partial) = (&body, &partial);
        retry_transient(self.retry, "speech request", move || async move {
            let resp = self.post_json("audio/speech", body).await?;
            if let Err(e) = stream_to_file(resp, partial).await {
                let _ = tokio::fs::remove_file(partial).await;
                return Err(e);
            }
            tokio::fs::rename(partial, dest).await.map_err(|e| {
                RedubError::media(format!(
                    "failed to move '{}' into place: {e}",
                    partial.display()
                ))
            })
        })
        .await
    }
}

/// `<dest>.part`: speech audio lands here and is renamed onto `dest` once complete.
pub(crate) fn partial_path_for(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "speech".into());
    name.push(".part");
    dest.with_file_name(name)
}

async fn stream_to_file(resp: reqwest::Response, dest: &Path) -> RedubResult<()> {
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| RedubError::media(format!("failed to create '{}': {e}", dest.display())))?;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(transport_error)?;
        file.write_all(&chunk)
            .await
            .map_err(|e| RedubError::media(format!("failed to write '{}': {e}", dest.display())))?;
    }
    file.flush()
        .await
        .map_err(|e| RedubError::media(format!("failed to flush '{}': {e}", dest.display())))
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, audio_path: &Path) -> RedubResult<Vec<TimedSegment>> {
        if !audio_path.is_file() {
            return Err(RedubError::input(format!(
                "audio file not found: {}",
                audio_path.display()
            )));
        }

        let response_format = transcription_response_format(&self.transcription_model);
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());

        let request_summary = serde_json::json!({
            "model": self.transcription_model,
            "response_format": response_format,
            "file": file_name,
        });
        save_snapshot(
            audio_path.parent(),
            "transcription",
            audio_path
                .file_stem()
                .map(|s| s.to_string_lossy())
                .as_deref()
                .unwrap_or("request"),
            &serde_json::to_string_pretty(&request_summary).unwrap_or_default(),
            "json",
        );

        let bytes = tokio::fs::read(audio_path).await.map_err(|e| {
            RedubError::input(format!("failed to read '{}': {e}", audio_path.display()))
        })?;

        let (bytes, file_name) = (&bytes, &file_name);
        let raw: RawTranscript = retry_transient(self.retry, "transcription request", move || async move {
            let part = Part::bytes(bytes.clone())
                .file_name(file_name.clone())
                .mime_str("audio/wav")
                .map_err(transport_error)?;
            let form = Form::new()
                .text("model", self.transcription_model.clone())
                .text("response_format", response_format)
                .part("file", part);
            let resp = self
                .http
                .post(self.url("audio/transcriptions"))
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await
                .map_err(transport_error)?;
            let resp = check_status(resp).await?;
            resp.json::<RawTranscript>()
                .await
                .map_err(|e| RedubError::serde(format!("transcription response parse failed: {e}")))
        })
        .await?;

        let needs_duration = raw.segments.as_ref().is_none_or(|s| s.is_empty());
        let duration = if needs_duration {
            let path = audio_path.to_path_buf();
            tokio::task::spawn_blocking(move || measure_duration_secs(&path))
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let segments = segments_from_transcript(&raw, duration);
        tracing::info!("transcribed {} segments", segments.len());
        Ok(segments)
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl Translator for OpenAiClient {
    async fn translate(
        &self,
        segments: &[TimedSegment],
        target_language: &str,
    ) -> RedubResult<Vec<TimedSegment>> {
        let target_language = target_language.trim();
        if segments.is_empty() || target_language.is_empty() {
            return Ok(segments.to_vec());
        }

        let payload = serde_json::json!({
            "target_language": target_language,
            "segments": segments
                .iter()
                .enumerate()
                .map(|(index, s)| serde_json::json!({"index": index, "text": s.text}))
                .collect::<Vec<_>>(),
        });
        let payload_text = serde_json::to_string(&payload)
            .map_err(|e| RedubError::serde(format!("translation payload encode failed: {e}")))?;

        let mut system = TRANSLATION_SYSTEM_PROMPT.to_string();
        if let Some(extra) = self
            .translation_instruction
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            system.push_str("\n\n");
            system.push_str(extra);
        }

        let body = serde_json::json!({
            "model": self.translation_model,
            "temperature": 0.0,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": payload_text},
            ],
        });
        save_snapshot(
            self.snapshot_root.as_deref(),
            "translation",
            target_language,
            &serde_json::to_string_pretty(&body).unwrap_or_default(),
            "json",
        );

        let body = &body;
        let reply: ChatResponse = retry_transient(self.retry, "translation request", move || async move {
            let resp = self.post_json("chat/completions", body).await?;
            resp.json::<ChatResponse>()
                .await
                .map_err(|e| RedubError::serde(format!("translation response parse failed: {e}")))
        })
        .await?;

        let text: String = reply
            .choices
            .into_iter()
            .filter_map(|c| c.message.and_then(|m| m.content))
            .collect();
        let items = parse_translation_reply(&text);
        if items.is_empty() {
            tracing::warn!("translation reply contained no usable items; keeping source text");
        }
        Ok(apply_translations(segments, &items))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/providers/openai.rs"]
mod tests;
