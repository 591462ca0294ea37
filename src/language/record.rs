use std::fmt::Write as _;

use crate::error::{Result, SubsError};
use crate::subtitle::{format_timestamp, parse_timestamp};
use crate::transcribe::TranscriptSegment;

const HEADER_KEY: &str = "Language";

/// Language detected in one window of the audio
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDetection {
    pub offset: f64,
    pub language: String,
}

/// Persisted outcome of a language detection pass for one video.
///
/// Text form:
///
/// ```text
/// Language: hi
///
/// 0:00:00  hi
/// 0:00:30  en
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageDetectionRecord {
    pub detected_language: String,
    pub chunk_log: Vec<ChunkDetection>,
}

impl LanguageDetectionRecord {
    /// Build a record from detection windows. Windows without a start offset
    /// or without a language are left out of the log.
    pub fn from_detections(detected_language: impl Into<String>, windows: &[TranscriptSegment]) -> Self {
        let chunk_log = windows
            .iter()
            .filter_map(|window| {
                let offset = window.start?;
                let language = window.language.clone()?;
                Some(ChunkDetection { offset, language })
            })
            .collect();

        Self {
            detected_language: detected_language.into(),
            chunk_log,
        }
    }

    pub fn render(&self) -> String {
        let mut content = format!("{}: {}\n\n", HEADER_KEY, self.detected_language);
        for chunk in &self.chunk_log {
            // Writing into a String cannot fail
            let _ = writeln!(content, "{}  {}", format_timestamp(chunk.offset), chunk.language);
        }
        content
    }

    /// Parse the text form. Only the header is authoritative; log lines that
    /// do not parse are ignored.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines();
        let header = lines
            .next()
            .ok_or_else(|| SubsError::LanguageCacheCorrupt("empty file".to_string()))?;

        let (key, code) = header
            .split_once(':')
            .ok_or_else(|| SubsError::LanguageCacheCorrupt(format!("missing ':' in header {:?}", header)))?;

        if !key.trim().eq_ignore_ascii_case(HEADER_KEY) {
            return Err(SubsError::LanguageCacheCorrupt(format!("unexpected header {:?}", header)));
        }

        let detected_language = code.trim();
        if detected_language.is_empty() {
            return Err(SubsError::LanguageCacheCorrupt("header has no language code".to_string()));
        }

        let chunk_log = lines
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let offset = parse_timestamp(fields.next()?)?;
                let language = fields.next()?.to_string();
                Some(ChunkDetection { offset, language })
            })
            .collect();

        Ok(Self {
            detected_language: detected_language.to_string(),
            chunk_log,
        })
    }
}
