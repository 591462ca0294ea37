use std::path::{Path, PathBuf};

use crate::error::{Result, SubsError};

/// Files derived from a video, all siblings of the source named after its stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub language: PathBuf,
    pub subtitle: PathBuf,
}

impl ArtifactPaths {
    pub fn for_video<P: AsRef<Path>>(video: P) -> Result<Self> {
        let video = video.as_ref();
        let stem = video
            .file_stem()
            .ok_or_else(|| SubsError::UnsupportedFormat(format!("Invalid video filename: {}", video.display())))?
            .to_string_lossy();

        let mut language_name = stem.into_owned();
        language_name.push_str("lang.txt");

        Ok(Self {
            video: video.to_path_buf(),
            audio: video.with_extension("wav"),
            language: video.with_file_name(language_name),
            subtitle: video.with_extension("srt"),
        })
    }
}
