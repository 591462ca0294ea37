use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use crate::error::{Result, SubsError};

fn default_detection_window_seconds() -> u32 {
    30
}

fn default_chunk_seconds() -> u32 {
    10
}

fn default_translate() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub subbing: SubbingParameters,
    #[serde(default)]
    pub transcriber: TranscriberConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

/// Per-batch processing switches. Immutable for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubbingParameters {
    /// Overwrite an existing subtitle file instead of skipping the video
    pub replace: bool,
    /// Let the engine detect the language per segment
    pub multi_lang: bool,
    /// Re-detect the language even if a cached detection exists
    pub replace_lang: bool,
    /// Use `provided_lang` and bypass detection
    pub provide_lang: bool,
    /// Explicit language code, only meaningful with `provide_lang`
    pub provided_lang: String,
    /// Keep extracted audio and the language cache after processing
    pub preserve_intermediary_files: bool,
}

impl SubbingParameters {
    /// Reject parameter combinations that cannot be honoured for any item.
    pub fn validate(&self) -> Result<()> {
        if self.provide_lang && self.provided_lang.trim().is_empty() {
            return Err(SubsError::Config(
                "provide_lang is set but no language code was given".to_string(),
            ));
        }
        if self.provide_lang && self.multi_lang {
            return Err(SubsError::Config(
                "an explicit language cannot be combined with multi-language detection".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a file-level language detection should be written to the cache artifact.
    pub fn persist_language(&self) -> bool {
        self.preserve_intermediary_files
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Path to transcriber binary (e.g., whisper-cli)
    pub binary_path: String,
    /// Model name from the catalog, or a path to a ggml model file
    pub model: String,
    /// Directory holding downloaded models
    pub models_dir: PathBuf,
    /// Worker threads handed to the engine; `None` keeps its default
    #[serde(default)]
    pub threads: Option<u32>,
    /// Ask the engine to translate into English
    #[serde(default = "default_translate")]
    pub translate: bool,
    /// Window length used for language detection
    #[serde(default = "default_detection_window_seconds")]
    pub detection_window_seconds: u32,
    /// Engine chunk length; also the fallback length of a segment without an end
    #[serde(default = "default_chunk_seconds")]
    pub chunk_seconds: u32,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            binary_path: "whisper-cli".to_string(),
            model: "large-v3".to_string(),
            models_dir: PathBuf::from(".whispersubs").join("models"),
            threads: None,
            translate: default_translate(),
            detection_window_seconds: default_detection_window_seconds(),
            chunk_seconds: default_chunk_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
        }
    }
}

/// How the root path of a batch is turned into items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputMode {
    /// The root path is the only item
    File,
    /// Direct children of the root directory
    Folder,
    /// Every descendant of the root directory
    FolderRecursive,
}

impl FromStr for InputMode {
    type Err = SubsError;

    fn from_str(mode: &str) -> Result<Self> {
        match mode.to_lowercase().as_str() {
            "file" => Ok(InputMode::File),
            "folder" => Ok(InputMode::Folder),
            "folder-recursive" | "rootdir" => Ok(InputMode::FolderRecursive),
            _ => Err(SubsError::Config(format!(
                "Invalid input mode '{}'. Valid modes: file, folder, folder-recursive",
                mode
            ))),
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputMode::File => "file",
            InputMode::Folder => "folder",
            InputMode::FolderRecursive => "folder-recursive",
        };
        f.write_str(name)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubsError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SubsError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubsError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubsError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
