//! Diagnostic snapshots of requests sent to providers.
//!
//! Snapshots are written under `<root>/prompts/<category>/` and are never required for
//! correctness: every failure is logged and swallowed.

use std::path::{Path, PathBuf};

/// Persist `content` as `<root>/prompts/<category>/<name>.<suffix>`.
///
/// Existing files are never overwritten; a numeric suffix (`_2`, `_3`, ...) is appended
/// instead. Returns the written path, or `None` when `root` is `None` or writing failed.
pub fn save_snapshot(
    root: Option<&Path>,
    category: &str,
    name: &str,
    content: &str,
    suffix: &str,
) -> Option<PathBuf> {
    let root = root?;

    let category = if category.is_empty() {
        "general".to_string()
    } else {
        sanitize_token(category)
    };
    let name = sanitize_token(name);
    let suffix = match suffix.trim_start_matches('.') {
        "" => "txt",
        s => s,
    };

    let dir = root.join("prompts").join(category);
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!("failed to create snapshot directory '{}': {e}", dir.display());
        return None;
    }

    let mut candidate = dir.join(format!("{name}.{suffix}"));
    let mut counter = 2u32;
    while candidate.exists() {
        candidate = dir.join(format!("{name}_{counter}.{suffix}"));
        counter += 1;
    }

    match std::fs::write(&candidate, content) {
        Ok(()) => Some(candidate),
        Err(e) => {
            tracing::warn!("failed to write snapshot '{}': {e}", candidate.display());
            None
        }
    }
}

/// Replace anything outside `[A-Za-z0-9_-]` with `_` and trim edge underscores.
pub(crate) fn sanitize_token(token: &str) -> String {
    let cleaned: String = token
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        "prompt".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/snapshot.rs"]
mod tests;
