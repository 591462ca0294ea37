use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tracing::debug;

use crate::artifacts::ArtifactPaths;
use crate::error::{Result, SubsError};
use super::LanguageDetectionRecord;

/// Key -> record storage for language detections, keyed by video path.
#[async_trait]
pub trait LanguageStore: Send + Sync {
    /// Fetch the record for `video`.
    ///
    /// `Ok(None)` means nothing is stored; an unreadable record is reported
    /// as `SubsError::LanguageCacheCorrupt`.
    async fn load(&self, video: &Path) -> Result<Option<LanguageDetectionRecord>>;

    async fn save(&self, video: &Path, record: &LanguageDetectionRecord) -> Result<()>;

    /// Remove the record for `video`, returning whether one existed.
    async fn remove(&self, video: &Path) -> Result<bool>;
}

/// Stores each record as `<stem>lang.txt` next to the video.
#[derive(Debug, Default, Clone, Copy)]
pub struct SiblingFileStore;

#[async_trait]
impl LanguageStore for SiblingFileStore {
    async fn load(&self, video: &Path) -> Result<Option<LanguageDetectionRecord>> {
        let path = ArtifactPaths::for_video(video)?.language;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SubsError::LanguageCacheCorrupt(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
        };

        debug!("Read language cache {}", path.display());
        LanguageDetectionRecord::parse(&content).map(Some)
    }

    async fn save(&self, video: &Path, record: &LanguageDetectionRecord) -> Result<()> {
        let path = ArtifactPaths::for_video(video)?.language;
        fs::write(&path, record.render()).await
            .map_err(|e| SubsError::serialization(&path, e))?;

        debug!("Wrote language cache {}", path.display());
        Ok(())
    }

    async fn remove(&self, video: &Path) -> Result<bool> {
        let path = ArtifactPaths::for_video(video)?.language;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SubsError::Io(e)),
        }
    }
}

/// Process-local store, for callers that do not want artifacts on disk.
#[derive(Debug, Default)]
pub struct MemoryLanguageStore {
    records: Mutex<HashMap<PathBuf, LanguageDetectionRecord>>,
}

impl MemoryLanguageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, LanguageDetectionRecord>> {
        // A poisoned map still holds complete records
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LanguageStore for MemoryLanguageStore {
    async fn load(&self, video: &Path) -> Result<Option<LanguageDetectionRecord>> {
        let record = self.records().get(video).cloned();
        Ok(record)
    }

    async fn save(&self, video: &Path, record: &LanguageDetectionRecord) -> Result<()> {
        self.records().insert(video.to_path_buf(), record.clone());
        Ok(())
    }

    async fn remove(&self, video: &Path) -> Result<bool> {
        let removed = self.records().remove(video).is_some();
        Ok(removed)
    }
}
