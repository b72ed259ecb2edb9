use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use sha2::{Digest as _, Sha256};

use crate::foundation::core::TimedSegment;
use crate::foundation::error::{RedubError, RedubResult};

#[derive(Clone, Debug)]
/// On-disk transcript cache addressed by the SHA-256 of the audio file contents.
///
/// The cache is an optimization only: unreadable or corrupt entries are misses and write
/// failures are logged.
pub struct TranscriptStore {
    root: PathBuf,
}

impl TranscriptStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Content key for `audio_path`.
    pub fn key_for(&self, audio_path: &Path) -> RedubResult<String> {
        let file = File::open(audio_path)
            .with_context(|| format!("open '{}' for hashing", audio_path.display()))?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut BufReader::new(file), &mut hasher)
            .with_context(|| format!("hash '{}'", audio_path.display()))?;
        Ok(sha256_hex(&hasher.finalize()))
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.transcript.json"))
    }

    /// Cached segments for `audio_path`, or `None` on any kind of miss.
    pub fn load(&self, audio_path: &Path) -> Option<Vec<TimedSegment>> {
        let key = match self.key_for(audio_path) {
            Ok(k) => k,
            Err(e) => {
                tracing::warn!("transcript cache lookup skipped: {e}");
                return None;
            }
        };
        let path = self.entry_path(&key);
        if !path.is_file() {
            return None;
        }
        match read_entry(&path) {
            Ok(segments) => {
                tracing::info!("loaded cached transcript {}", path.display());
                Some(segments)
            }
            Err(e) => {
                tracing::warn!("ignoring unusable cached transcript '{}': {e}", path.display());
                None
            }
        }
    }

    /// Best-effort write of `segments` for `audio_path`.
    pub fn store(&self, audio_path: &Path, segments: &[TimedSegment]) -> Option<PathBuf> {
        let result = self.key_for(audio_path).and_then(|key| {
            let path = self.entry_path(&key);
            std::fs::create_dir_all(&self.root)
                .with_context(|| format!("create cache directory '{}'", self.root.display()))?;
            let json = serde_json::to_vec_pretty(segments)
                .map_err(|e| RedubError::serde(format!("transcript encode failed: {e}")))?;
            std::fs::write(&path, json)
                .with_context(|| format!("write '{}'", path.display()))?;
            Ok(path)
        });
        match result {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("failed to cache transcript: {e}");
                None
            }
        }
    }
}

fn read_entry(path: &Path) -> RedubResult<Vec<TimedSegment>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    let segments: Vec<TimedSegment> = serde_json::from_slice(&bytes)
        .map_err(|e| RedubError::serde(format!("cached transcript parse failed: {e}")))?;
    for seg in &segments {
        seg.validate()?;
    }
    Ok(segments)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/transcript/cache.rs"]
mod tests;
