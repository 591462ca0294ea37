// Transcription capability
//
// The engine is a single stateful resource (model weights, device context).
// It is constructed once per batch by the caller and handed to the
// orchestrator, which owns it exclusively and calls it one item at a time.
//
// - WhisperCpp: drives the whisper.cpp `whisper-cli` binary

pub mod common;
pub mod whisper_cpp;

use async_trait::async_trait;

pub use common::*;
use crate::config::TranscriberConfig;
use crate::error::Result;

/// Speech recognition over an extracted audio track
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio, returning segments in chronological order.
    ///
    /// In `DecodeMode::LanguageDetection` every returned segment covers one
    /// detection window and carries its detected language.
    async fn transcribe(&mut self, audio: &AudioHandle, mode: &DecodeMode) -> Result<Vec<TranscriptSegment>>;

    /// Check that the engine can be invoked at all
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create the default transcriber (whisper.cpp) with a resolved model path
    pub fn create_default(config: TranscriberConfig, model_path: std::path::PathBuf) -> Box<dyn Transcriber> {
        Box::new(whisper_cpp::WhisperCppTranscriber::new(config, model_path))
    }
}
