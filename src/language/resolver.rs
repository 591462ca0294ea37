use std::path::Path;
use tracing::{info, warn};

use crate::error::{Result, SubsError};
use crate::transcribe::{AudioHandle, DecodeMode, Transcriber};
use super::{LanguageDetectionRecord, LanguageStore, majority_language};

/// Picks the single language a video is decoded in.
pub struct LanguageResolver {
    store: Box<dyn LanguageStore>,
}

impl LanguageResolver {
    pub fn new(store: Box<dyn LanguageStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn LanguageStore {
        self.store.as_ref()
    }

    /// Resolve the language of `video`.
    ///
    /// A stored record wins unless `replace_lang` is set. Otherwise the
    /// engine runs in detection mode and the majority language over all
    /// windows is used; with `persist` the detection is stored for later runs.
    /// A forced re-detection that is not persisted drops the old record.
    pub async fn resolve(
        &self,
        video: &Path,
        audio: &AudioHandle,
        transcriber: &mut dyn Transcriber,
        replace_lang: bool,
        persist: bool,
    ) -> Result<String> {
        if !replace_lang {
            match self.store.load(video).await {
                Ok(Some(record)) => {
                    info!("Using cached language '{}' for {}", record.detected_language, video.display());
                    return Ok(record.detected_language);
                }
                Ok(None) => {}
                Err(e) => warn!("Ignoring language cache for {}: {}", video.display(), e),
            }
        }

        info!("Detecting language of {}", video.display());
        let windows = transcriber.transcribe(audio, &DecodeMode::LanguageDetection).await?;

        let language = majority_language(windows.iter().filter_map(|w| w.language.as_deref()))
            .ok_or_else(|| {
                SubsError::Transcription(format!("No language detected in {}", video.display()))
            })?;
        info!("Detected language '{}' over {} windows", language, windows.len());

        if persist {
            let record = LanguageDetectionRecord::from_detections(language.clone(), &windows);
            self.store.save(video, &record).await?;
        } else if replace_lang {
            // The stored record no longer matches what this run decoded with
            match self.store.remove(video).await {
                Ok(true) => info!("Removed stale language cache for {}", video.display()),
                Ok(false) => {}
                Err(e) => warn!("Failed to remove language cache for {}: {}", video.display(), e),
            }
        }

        Ok(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{MemoryLanguageStore, SiblingFileStore};
    use crate::transcribe::{MockTranscriber, TranscriptSegment};

    fn window(start: Option<f64>, language: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, start.map(|s| s + 30.0), "").with_language(language)
    }

    fn detecting(windows: Vec<TranscriptSegment>) -> MockTranscriber {
        let mut transcriber = MockTranscriber::new();
        transcriber
            .expect_transcribe()
            .withf(|_, mode| *mode == DecodeMode::LanguageDetection)
            .times(1)
            .returning(move |_, _| Ok(windows.clone()));
        transcriber
    }

    #[tokio::test]
    async fn test_cache_round_trip_skips_second_detection() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("talk.mp4");
        let audio = AudioHandle::new(dir.path().join("talk.wav"));
        let resolver = LanguageResolver::new(Box::new(SiblingFileStore));

        let mut first = detecting(vec![
            window(Some(0.0), "hi"),
            window(None, "en"),
            window(Some(60.0), "hi"),
        ]);
        let language = resolver.resolve(&video, &audio, &mut first, false, true).await.unwrap();
        assert_eq!(language, "hi");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("talklang.txt")).unwrap(),
            "Language: hi\n\n0:00:00  hi\n0:01:00  hi\n"
        );

        let mut second = MockTranscriber::new();
        second.expect_transcribe().times(0);
        let cached = resolver.resolve(&video, &audio, &mut second, false, true).await.unwrap();
        assert_eq!(cached, "hi");
    }

    #[tokio::test]
    async fn test_replace_lang_forces_detection() {
        let store = MemoryLanguageStore::new();
        let video = Path::new("/videos/talk.mp4");
        store
            .save(video, &LanguageDetectionRecord { detected_language: "fr".to_string(), chunk_log: vec![] })
            .await
            .unwrap();
        let resolver = LanguageResolver::new(Box::new(store));
        let audio = AudioHandle::new("/videos/talk.wav");

        let mut transcriber = detecting(vec![window(Some(0.0), "de")]);
        let language = resolver.resolve(video, &audio, &mut transcriber, true, true).await.unwrap();

        assert_eq!(language, "de");
        let stored = resolver.store().load(video).await.unwrap().unwrap();
        assert_eq!(stored.detected_language, "de");
    }

    #[tokio::test]
    async fn test_unpersisted_redetection_drops_stale_record() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("talk.mp4");
        std::fs::write(dir.path().join("talklang.txt"), "Language: fr\n\n").unwrap();
        let resolver = LanguageResolver::new(Box::new(SiblingFileStore));
        let audio = AudioHandle::new(dir.path().join("talk.wav"));

        let mut transcriber = detecting(vec![window(Some(0.0), "de")]);
        let language = resolver.resolve(&video, &audio, &mut transcriber, true, false).await.unwrap();

        assert_eq!(language, "de");
        assert!(!dir.path().join("talklang.txt").exists());
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back_to_detection() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("talk.mp4");
        std::fs::write(dir.path().join("talklang.txt"), "???\n").unwrap();
        let resolver = LanguageResolver::new(Box::new(SiblingFileStore));
        let audio = AudioHandle::new(dir.path().join("talk.wav"));

        let mut transcriber = detecting(vec![window(Some(0.0), "es"), window(Some(30.0), "es")]);
        let language = resolver.resolve(&video, &audio, &mut transcriber, false, false).await.unwrap();

        assert_eq!(language, "es");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("talklang.txt")).unwrap(),
            "???\n"
        );
    }

    #[tokio::test]
    async fn test_null_offsets_still_vote() {
        let resolver = LanguageResolver::new(Box::new(MemoryLanguageStore::new()));
        let video = Path::new("/videos/talk.mp4");
        let audio = AudioHandle::new("/videos/talk.wav");

        let mut transcriber = detecting(vec![
            window(Some(0.0), "en"),
            window(None, "ja"),
            window(None, "ja"),
        ]);
        let language = resolver.resolve(video, &audio, &mut transcriber, false, true).await.unwrap();

        assert_eq!(language, "ja");
        let stored = resolver.store().load(video).await.unwrap().unwrap();
        assert_eq!(stored.chunk_log.len(), 1);
    }

    #[tokio::test]
    async fn test_no_windows_is_a_transcription_error() {
        let resolver = LanguageResolver::new(Box::new(MemoryLanguageStore::new()));
        let audio = AudioHandle::new("/videos/silence.wav");

        let mut transcriber = detecting(vec![]);
        let err = resolver
            .resolve(Path::new("/videos/silence.mp4"), &audio, &mut transcriber, false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SubsError::Transcription(_)));
    }
}
