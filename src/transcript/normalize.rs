//! Normalization of transcript payloads into [`TimedSegment`] lists.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::foundation::core::TimedSegment;
use crate::foundation::error::{RedubError, RedubResult};

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence pattern is valid"));

/// Seconds assumed per sentence when the audio duration is unknown.
const FALLBACK_SECS_PER_SENTENCE: f64 = 2.5;

#[derive(Debug, Default, Deserialize)]
/// Transcript payload as returned by a speech-to-text service.
pub struct RawTranscript {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub segments: Option<Vec<Value>>,
}

/// Turn loosely-typed segment objects into valid segments.
///
/// Times may be numbers or numeric strings. Entries with unusable times or blank text are
/// dropped; negative starts clamp to zero and ends never precede starts.
pub fn normalize_segments(raw: &[Value]) -> Vec<TimedSegment> {
    raw.iter().filter_map(segment_from_value).collect()
}

fn segment_from_value(value: &Value) -> Option<TimedSegment> {
    let obj = value.as_object()?;
    let start = match obj.get("start") {
        None | Some(Value::Null) => 0.0,
        Some(v) => lenient_f64(v)?,
    };
    let end = match obj.get("end") {
        None | Some(Value::Null) => start,
        Some(v) => lenient_f64(v)?,
    };
    let text = match obj.get("text") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if text.is_empty() {
        return None;
    }

    let start = start.max(0.0);
    let end = end.max(start);
    TimedSegment::new(start, end, text).ok()
}

fn lenient_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Segments from a transcript payload, falling back to sentence-based timing when the service
/// returned text without timestamps.
pub fn segments_from_transcript(raw: &RawTranscript, audio_duration_secs: f64) -> Vec<TimedSegment> {
    let segments = normalize_segments(raw.segments.as_deref().unwrap_or_default());
    if !segments.is_empty() {
        return segments;
    }
    match raw.text.as_deref() {
        Some(text) if !text.trim().is_empty() => approximate_segments(text, audio_duration_secs),
        _ => Vec::new(),
    }
}

/// Split `text` into sentences and spread them over `duration_secs` by character share.
///
/// Every sentence but the last gets at least `duration / (2 * n)`; the last one always ends at
/// the duration. A non-positive duration assumes 2.5 s per sentence.
pub fn approximate_segments(text: &str, duration_secs: f64) -> Vec<TimedSegment> {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return Vec::new();
    }

    let n = sentences.len();
    let mut duration = if duration_secs.is_finite() {
        duration_secs.max(0.0)
    } else {
        0.0
    };
    if duration <= 0.0 {
        duration = n as f64 * FALLBACK_SECS_PER_SENTENCE;
    }

    let total_chars = match sentences.iter().map(|s| s.chars().count()).sum::<usize>() {
        0 => n,
        c => c,
    };
    let min_slice = duration / (n as f64 * 2.0);

    let mut out = Vec::with_capacity(n);
    let mut cursor = 0.0f64;
    for (i, sentence) in sentences.iter().enumerate() {
        cursor = cursor.min(duration);
        let end = if i == n - 1 {
            duration
        } else {
            let share = sentence.chars().count() as f64 / total_chars as f64;
            let slice = (duration * share).max(min_slice);
            let mut end = duration.min(cursor + slice);
            if end <= cursor && duration > cursor {
                end = duration.min(cursor + min_slice);
            }
            end
        };
        out.push(TimedSegment {
            start: cursor,
            end,
            text: sentence.to_string(),
        });
        cursor = end;
    }
    out
}

fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut out = Vec::new();
    let mut last = 0usize;
    for m in SENTENCE_BOUNDARY.find_iter(text) {
        // Keep the punctuation with its sentence.
        let cut = m.start() + 1;
        out.push(text[last..cut].trim());
        last = m.end();
    }
    out.push(text[last..].trim());
    out.retain(|s| !s.is_empty());
    out
}

/// Parse a transcript JSON document: either a bare segment array or an object with `segments`.
pub fn parse_transcript_json(json: &str) -> RedubResult<Vec<TimedSegment>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| RedubError::serde(format!("transcript is not valid JSON: {e}")))?;
    match value {
        Value::Array(items) => Ok(normalize_segments(&items)),
        Value::Object(_) => {
            let raw: RawTranscript = serde_json::from_value(value)
                .map_err(|e| RedubError::serde(format!("unexpected transcript shape: {e}")))?;
            Ok(segments_from_transcript(&raw, 0.0))
        }
        _ => Err(RedubError::serde(
            "transcript must be a JSON array or an object with 'segments'",
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transcript/normalize.rs"]
mod tests;
