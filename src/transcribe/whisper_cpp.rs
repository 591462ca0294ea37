use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, SubsError};
use super::{AudioHandle, DecodeMode, Transcriber, TranscriptSegment, common::wav_duration_seconds};

/// Whisper.cpp specific JSON output format (`-oj`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOutput {
    pub result: WhisperCppResult,
    #[serde(default)]
    pub transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppResult {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppSegment {
    pub offsets: WhisperCppOffsets,
    pub text: String,
}

/// Segment bounds in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOffsets {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl WhisperCppOutput {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SubsError::Transcription(format!("Failed to parse Whisper.cpp JSON: {}", e)))
    }

    /// Convert to engine-agnostic segments, tagging each with the detected language.
    pub fn into_segments(self) -> Vec<TranscriptSegment> {
        let language = self.result.language;
        self.transcription
            .into_iter()
            .map(|seg| TranscriptSegment {
                start: seg.offsets.from.map(millis_to_seconds),
                end: seg.offsets.to.map(millis_to_seconds),
                text: seg.text.trim().to_string(),
                language: Some(language.clone()),
            })
            .collect()
    }
}

fn millis_to_seconds(millis: i64) -> f64 {
    millis as f64 / 1000.0
}

/// Slice of the audio handed to one engine run, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    offset_ms: u64,
    duration_ms: u64,
}

/// Split `duration` seconds into consecutive windows of `window_seconds`.
fn detection_windows(duration: f64, window_seconds: u32) -> Vec<Window> {
    let total_ms = (duration.max(0.0) * 1000.0).round() as u64;
    let step_ms = u64::from(window_seconds.max(1)) * 1000;

    let mut windows = Vec::new();
    let mut offset_ms = 0;
    while offset_ms < total_ms {
        windows.push(Window {
            offset_ms,
            duration_ms: step_ms.min(total_ms - offset_ms),
        });
        offset_ms += step_ms;
    }
    windows
}

/// Transcriber backed by the whisper.cpp command line tool
pub struct WhisperCppTranscriber {
    config: TranscriberConfig,
    model_path: PathBuf,
}

impl WhisperCppTranscriber {
    pub fn new(config: TranscriberConfig, model_path: PathBuf) -> Self {
        Self { config, model_path }
    }

    /// Run whisper-cli once and return its parsed JSON output
    async fn run(&self, audio_path: &Path, language: &str, window: Option<Window>) -> Result<WhisperCppOutput> {
        let temp_dir = tempfile::tempdir()
            .map_err(|e| SubsError::Transcription(format!("Failed to create temp directory: {}", e)))?;
        let output_prefix = temp_dir.path().join("transcript");

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg("-m").arg(&self.model_path)
            .arg("-f").arg(audio_path)
            .arg("-l").arg(language)
            .arg("-oj")
            .arg("-of").arg(&output_prefix)
            .arg("-np");

        if self.config.translate {
            cmd.arg("-tr");
        }
        if let Some(threads) = self.config.threads {
            cmd.arg("-t").arg(threads.to_string());
        }
        if let Some(window) = window {
            cmd.arg("-ot").arg(window.offset_ms.to_string())
                .arg("-d").arg(window.duration_ms.to_string());
        }

        debug!("Executing whisper command: {:?}", cmd);

        let output = cmd.output().await
            .map_err(|e| SubsError::Transcription(format!("Failed to execute whisper: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubsError::Transcription(format!("Whisper failed: {}", stderr.trim())));
        }

        let json_file = output_prefix.with_extension("json");
        let json_content = tokio::fs::read_to_string(&json_file).await
            .map_err(|e| SubsError::Transcription(format!("Failed to read output: {}", e)))?;

        WhisperCppOutput::parse(&json_content)
    }

    /// One segment per detection window, tagged with the language detected in it
    async fn detect_languages(&self, audio_path: &Path) -> Result<Vec<TranscriptSegment>> {
        let duration = wav_duration_seconds(audio_path)?;
        let windows = detection_windows(duration, self.config.detection_window_seconds);
        info!(
            "Detecting language over {} windows of {}s",
            windows.len(),
            self.config.detection_window_seconds
        );

        let mut segments = Vec::with_capacity(windows.len());
        for window in windows {
            let output = self.run(audio_path, "auto", Some(window)).await?;
            let language = output.result.language.clone();
            let text = output
                .into_segments()
                .into_iter()
                .map(|seg| seg.text)
                .collect::<Vec<_>>()
                .join(" ");

            debug!("Window at {}ms detected as {}", window.offset_ms, language);
            segments.push(TranscriptSegment {
                start: Some(millis_to_seconds(window.offset_ms as i64)),
                end: Some(millis_to_seconds((window.offset_ms + window.duration_ms) as i64)),
                text,
                language: Some(language),
            });
        }

        Ok(segments)
    }
}

#[async_trait]
impl Transcriber for WhisperCppTranscriber {
    async fn transcribe(&mut self, audio: &AudioHandle, mode: &DecodeMode) -> Result<Vec<TranscriptSegment>> {
        match mode {
            DecodeMode::LanguageDetection => self.detect_languages(audio.path()).await,
            DecodeMode::MultiLanguage => {
                info!("Transcribing {} with automatic language detection", audio.path().display());
                Ok(self.run(audio.path(), "auto", None).await?.into_segments())
            }
            DecodeMode::SingleLanguage(language) => {
                info!("Transcribing {} as '{}'", audio.path().display(), language);
                Ok(self.run(audio.path(), language, None).await?.into_segments())
            }
        }
    }

    async fn check_availability(&self) -> Result<()> {
        if !self.model_path.is_file() {
            return Err(SubsError::Config(format!(
                "Whisper model not found at {}",
                self.model_path.display()
            )));
        }

        let output = Command::new(&self.config.binary_path)
            .arg("--help")
            .output()
            .await
            .map_err(|e| SubsError::Config(format!("Whisper binary '{}' not found: {}", self.config.binary_path, e)))?;

        if output.status.success() {
            info!("Whisper binary is available");
            Ok(())
        } else {
            Err(SubsError::Config(format!(
                "Whisper binary '{}' failed to start",
                self.config.binary_path
            )))
        }
    }
}
