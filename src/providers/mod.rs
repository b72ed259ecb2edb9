//! Collaborator boundaries.
//!
//! The engine only sees these traits. Provider payload shapes are normalized inside each
//! implementation, so everything past this boundary works with [`TimedSegment`] values and files
//! on disk.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::foundation::core::TimedSegment;
use crate::foundation::error::RedubResult;

pub mod openai;
pub mod reply;
pub mod retry;

#[derive(Clone, Debug, PartialEq, Eq)]
/// One text-to-speech call.
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
    pub instruction: Option<String>,
}

/// Text-to-speech backend that writes rendered audio to a file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `request` and stream the audio bytes into `dest`.
    async fn synthesize(&self, request: &SpeechRequest, dest: &Path) -> RedubResult<()>;
}

/// Produces timed segments from an audio file.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> RedubResult<Vec<TimedSegment>>;
}

/// Replaces segment text with a translation, keeping timing untouched.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        segments: &[TimedSegment],
        target_language: &str,
    ) -> RedubResult<Vec<TimedSegment>>;
}

#[derive(Clone)]
/// The three collaborators a full pipeline run needs.
pub struct Providers {
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

impl Providers {
    /// Use one client for every role.
    pub fn from_shared<P>(provider: Arc<P>) -> Self
    where
        P: Transcriber + Translator + SpeechSynthesizer + 'static,
    {
        Self {
            transcriber: provider.clone(),
            translator: provider.clone(),
            speech: provider,
        }
    }
}
