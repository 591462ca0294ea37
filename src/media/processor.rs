use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::config::MediaConfig;
use crate::error::{Result, SubsError};
use crate::transcribe::AudioHandle;
use super::{AudioExtractor, MediaCommandBuilder};

/// ffmpeg stderr fragments meaning the input has no audio stream to map
const NO_AUDIO_MARKERS: [&str; 2] = ["matches no streams", "does not contain any stream"];

/// Decide whether a failed extraction failed because there is no audio
fn reports_missing_audio(stderr: &str) -> bool {
    NO_AUDIO_MARKERS.iter().any(|marker| stderr.contains(marker))
}

/// FFmpeg-based audio extractor
pub struct FfmpegAudioExtractor {
    command_builder: MediaCommandBuilder,
}

impl FfmpegAudioExtractor {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            command_builder: MediaCommandBuilder::new(config.binary_path),
        }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegAudioExtractor {
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<AudioHandle> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        let command = self.command_builder.extract_audio(video_path, audio_path);
        let output = command.run().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if reports_missing_audio(&stderr) {
                return Err(SubsError::NoAudioTrack(video_path.display().to_string()));
            }
            return Err(SubsError::Media(format!(
                "Audio extraction failed: {}",
                stderr.trim()
            )));
        }

        info!("Audio extraction completed");
        Ok(AudioHandle::new(audio_path))
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder.version_check().execute().await
            .map_err(|e| SubsError::Config(format!("Media processor not available: {}", e)))?;

        info!("Media processor is available");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_audio_detection() {
        assert!(reports_missing_audio(
            "Stream map '0:a:0' matches no streams.\nTo ignore this, add a trailing '?' to the map."
        ));
        assert!(reports_missing_audio("Output file #0 does not contain any stream"));
        assert!(!reports_missing_audio("clip.mov: Invalid data found when processing input"));
    }

    #[tokio::test]
    async fn test_unavailable_binary_is_a_config_error() {
        let extractor = FfmpegAudioExtractor::new(MediaConfig {
            binary_path: "definitely-not-an-installed-ffmpeg".to_string(),
        });
        assert!(matches!(
            extractor.check_availability().await,
            Err(SubsError::Config(_))
        ));
    }
}
