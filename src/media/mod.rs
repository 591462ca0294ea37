// Media processing
//
// - Commands: ffmpeg command builders
// - Processor: audio extraction on top of the builders

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;
use crate::transcribe::AudioHandle;

/// Turns a video into decoded audio the transcriber can consume
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Extract the audio track of `video_path` into `audio_path`.
    ///
    /// Fails with `SubsError::NoAudioTrack` when the video carries no audio stream.
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<AudioHandle>;

    /// Check if the extractor can be invoked
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating audio extractor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default extractor implementation (FFmpeg-based)
    pub fn create_extractor(config: MediaConfig) -> Box<dyn AudioExtractor> {
        Box::new(processor::FfmpegAudioExtractor::new(config))
    }
}
