use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::artifacts::ArtifactPaths;
use crate::config::SubbingParameters;
use crate::discovery::is_supported_video;
use crate::error::{Result, SubsError};
use crate::language::{LanguageResolver, LanguageStore};
use crate::media::AudioExtractor;
use crate::subtitle::{write_srt, FALLBACK_SEGMENT_SECONDS};
use crate::transcribe::{AudioHandle, DecodeMode, Transcriber};

/// Terminal state of one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Subtitle written
    Done,
    /// Subtitle already present and `replace` is off
    Skipped,
    /// Extension is not a supported video format
    Rejected,
    /// A pipeline step failed; holds the error message
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub path: PathBuf,
    pub outcome: ItemOutcome,
}

/// Per-item outcomes of a batch, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
    /// Set when the batch stopped early on request
    pub cancelled: bool,
}

impl BatchReport {
    pub fn count(&self, predicate: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| predicate(&item.outcome)).count()
    }

    pub fn done(&self) -> usize {
        self.count(|o| *o == ItemOutcome::Done)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| *o == ItemOutcome::Skipped)
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| *o == ItemOutcome::Rejected)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|item| matches!(item.outcome, ItemOutcome::Failed(_)))
    }

    pub fn outcome_of(&self, path: &Path) -> Option<&ItemOutcome> {
        self.items.iter().find(|item| item.path == path).map(|item| &item.outcome)
    }
}

/// Notifications emitted while a batch runs. All methods default to no-ops.
pub trait BatchObserver: Send {
    fn on_batch_started(&mut self, _total: usize) {}

    fn on_item_started(&mut self, _path: &Path) {}

    fn on_item_complete(&mut self, _path: &Path) {}

    /// Item ended as `Skipped` or `Rejected`
    fn on_item_skipped(&mut self, _path: &Path, _outcome: &ItemOutcome) {}

    fn on_item_failed(&mut self, _path: &Path, _error: &SubsError) {}

    fn on_batch_finished(&mut self, _report: &BatchReport) {}
}

/// Observer that ignores every notification
pub struct NullObserver;

impl BatchObserver for NullObserver {}

/// Drives videos through extraction, language resolution, transcription and
/// subtitle writing, one at a time.
///
/// A failing item is recorded and the batch moves on; only invalid
/// parameters abort a run, and they are checked before the first item.
pub struct BatchOrchestrator {
    parameters: SubbingParameters,
    extractor: Box<dyn AudioExtractor>,
    resolver: LanguageResolver,
    fallback_segment_seconds: f64,
    cancelled: Arc<AtomicBool>,
}

impl BatchOrchestrator {
    pub fn new(
        parameters: SubbingParameters,
        extractor: Box<dyn AudioExtractor>,
        store: Box<dyn LanguageStore>,
    ) -> Self {
        Self {
            parameters,
            extractor,
            resolver: LanguageResolver::new(store),
            fallback_segment_seconds: FALLBACK_SEGMENT_SECONDS,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Length given to a transcript segment that has no end offset
    pub fn with_fallback_segment_seconds(mut self, seconds: f64) -> Self {
        self.fallback_segment_seconds = seconds;
        self
    }

    pub fn parameters(&self) -> &SubbingParameters {
        &self.parameters
    }

    /// Flag checked between items; setting it stops the batch before the next item.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Make sure the external tools can be invoked before committing to a batch
    pub async fn check_dependencies(&self, transcriber: &dyn Transcriber) -> Result<()> {
        self.extractor.check_availability().await?;
        transcriber.check_availability().await
    }

    /// Process `items` in order with exclusive use of `transcriber`.
    pub async fn run(
        &self,
        items: &[PathBuf],
        transcriber: &mut dyn Transcriber,
        observer: &mut dyn BatchObserver,
    ) -> Result<BatchReport> {
        self.parameters.validate()?;

        info!("Processing {} items", items.len());
        observer.on_batch_started(items.len());

        let mut report = BatchReport::default();
        for video_path in items {
            if self.cancelled.load(Ordering::SeqCst) {
                warn!(
                    "Batch cancelled, {} items not attempted",
                    items.len() - report.items.len()
                );
                report.cancelled = true;
                break;
            }

            observer.on_item_started(video_path);
            let outcome = match self.process_item(video_path, transcriber).await {
                Ok(ItemOutcome::Done) => {
                    info!("Successfully processed: {}", video_path.display());
                    observer.on_item_complete(video_path);
                    ItemOutcome::Done
                }
                Ok(outcome) => {
                    observer.on_item_skipped(video_path, &outcome);
                    outcome
                }
                Err(e) => {
                    error!("Failed to process {}: {}", video_path.display(), e);
                    observer.on_item_failed(video_path, &e);
                    ItemOutcome::Failed(e.to_string())
                }
            };

            report.items.push(ItemReport {
                path: video_path.clone(),
                outcome,
            });
        }

        info!(
            "Batch finished: {} done, {} skipped, {} rejected, {} failed",
            report.done(),
            report.skipped(),
            report.rejected(),
            report.failures().count()
        );
        observer.on_batch_finished(&report);
        Ok(report)
    }

    /// Run the batch on a background task, which takes ownership of the transcriber.
    pub fn spawn(
        self,
        items: Vec<PathBuf>,
        mut transcriber: Box<dyn Transcriber>,
        mut observer: Box<dyn BatchObserver>,
    ) -> JoinHandle<Result<BatchReport>> {
        tokio::spawn(async move {
            self.run(&items, transcriber.as_mut(), observer.as_mut()).await
        })
    }

    async fn process_item(&self, video_path: &Path, transcriber: &mut dyn Transcriber) -> Result<ItemOutcome> {
        if !is_supported_video(video_path) {
            warn!("Input file format not recognized: {}", video_path.display());
            return Ok(ItemOutcome::Rejected);
        }

        let paths = ArtifactPaths::for_video(video_path)?;
        if !self.parameters.replace && paths.subtitle.exists() {
            info!("Subtitle already exists, skipping: {}", paths.subtitle.display());
            return Ok(ItemOutcome::Skipped);
        }

        let result = self.subtitle_video(&paths, transcriber).await;

        if !self.parameters.preserve_intermediary_files {
            self.remove_intermediary(&paths).await;
        }

        result?;
        Ok(ItemOutcome::Done)
    }

    async fn subtitle_video(&self, paths: &ArtifactPaths, transcriber: &mut dyn Transcriber) -> Result<()> {
        let audio = self.extractor.extract_audio(&paths.video, &paths.audio).await?;
        debug!("Extracted audio to {}", audio.path().display());

        let mode = self.decode_mode(&paths.video, &audio, transcriber).await?;

        let segments = transcriber.transcribe(&audio, &mode).await?;
        debug!("Transcribed {} segments", segments.len());

        write_srt(&paths.subtitle, &segments, self.fallback_segment_seconds).await?;
        Ok(())
    }

    async fn decode_mode(
        &self,
        video_path: &Path,
        audio: &AudioHandle,
        transcriber: &mut dyn Transcriber,
    ) -> Result<DecodeMode> {
        if self.parameters.multi_lang {
            return Ok(DecodeMode::MultiLanguage);
        }

        let language = if self.parameters.provide_lang {
            self.parameters.provided_lang.trim().to_string()
        } else {
            self.resolver
                .resolve(
                    video_path,
                    audio,
                    transcriber,
                    self.parameters.replace_lang,
                    self.parameters.persist_language(),
                )
                .await?
        };
        debug!("Decoding {} as '{}'", video_path.display(), language);

        Ok(DecodeMode::SingleLanguage(language))
    }

    /// Delete the extracted audio. Failures are logged and otherwise ignored.
    async fn remove_intermediary(&self, paths: &ArtifactPaths) {
        match fs::remove_file(&paths.audio).await {
            Ok(()) => debug!("Removed {}", paths.audio.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", paths.audio.display(), e),
        }
    }
}
