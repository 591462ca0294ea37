use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One timed piece of text returned by the engine, in engine order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub text: String,
    pub language: Option<String>,
}

impl TranscriptSegment {
    pub fn new(start: Option<f64>, end: Option<f64>, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// How the engine should treat language for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeMode {
    /// Detect the language of every segment independently
    MultiLanguage,
    /// Force a single language for the whole file
    SingleLanguage(String),
    /// Only detect the language of each fixed window
    LanguageDetection,
}

/// Decoded mono 16kHz audio extracted from a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioHandle {
    path: PathBuf,
}

impl AudioHandle {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read the duration of a WAV file in seconds from its header.
pub fn wav_duration_seconds<P: AsRef<Path>>(path: P) -> crate::error::Result<f64> {
    let reader = hound::WavReader::open(path.as_ref()).map_err(|e| {
        crate::error::SubsError::Transcription(format!(
            "Failed to read audio header of {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Ok(0.0);
    }
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}
