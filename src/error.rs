use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Video file has no audio track: {0}")]
    NoAudioTrack(String),

    #[error("Language cache is corrupt: {0}")]
    LanguageCacheCorrupt(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Failed to write {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SubsError {
    pub fn serialization(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Serialization {
            path: path.display().to_string(),
            source,
        }
    }

    /// Errors that abort a whole batch rather than a single item.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, SubsError>;
