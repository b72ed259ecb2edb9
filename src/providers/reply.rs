//! Parsing of free-form translation replies.
//!
//! Chat models answer with JSON, sometimes wrapped in a Markdown fence, sometimes as an object
//! with a `segments` key. All of those shapes collapse into [`TranslatedItem`] values here.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::foundation::core::TimedSegment;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.+?)```").expect("fence pattern is valid")
});

#[derive(Clone, Debug, PartialEq, Eq)]
/// One translated segment text keyed by its position in the request.
pub struct TranslatedItem {
    pub index: usize,
    pub translation: String,
}

/// Extract `{index, translation}` items from a model reply.
///
/// The whole reply is tried first, then each fenced block. The first candidate that parses as
/// JSON wins; unparsable replies yield no items.
pub fn parse_translation_reply(reply: &str) -> Vec<TranslatedItem> {
    let reply = reply.trim();
    if reply.is_empty() {
        return Vec::new();
    }

    let fenced = FENCED_BLOCK
        .captures_iter(reply)
        .filter_map(|c| c.get(1).map(|m| m.as_str()));
    for candidate in std::iter::once(reply).chain(fenced) {
        let Ok(parsed) = serde_json::from_str::<Value>(candidate.trim()) else {
            continue;
        };
        let items = match &parsed {
            Value::Array(items) => items,
            Value::Object(obj) => match obj.get("segments") {
                Some(Value::Array(items)) => items,
                _ => continue,
            },
            _ => continue,
        };
        return items.iter().filter_map(item_from_value).collect();
    }
    Vec::new()
}

fn item_from_value(value: &Value) -> Option<TranslatedItem> {
    let obj = value.as_object()?;
    let index = usize::try_from(obj.get("index")?.as_u64()?).ok()?;
    let translation = obj.get("translation")?.as_str()?.to_string();
    Some(TranslatedItem { index, translation })
}

/// New segments with translated text; indices the reply skipped keep their original text.
pub fn apply_translations(segments: &[TimedSegment], items: &[TranslatedItem]) -> Vec<TimedSegment> {
    let by_index: HashMap<usize, &str> = items
        .iter()
        .map(|i| (i.index, i.translation.as_str()))
        .collect();
    segments
        .iter()
        .enumerate()
        .map(|(i, seg)| match by_index.get(&i) {
            Some(text) => seg.with_text(*text),
            None => seg.clone(),
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/providers/reply.rs"]
mod tests;
