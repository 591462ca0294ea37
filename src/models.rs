use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use reqwest::Client;
use tracing::{info, warn};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Result, SubsError};

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: &'static str,
    pub size_mb: f64,
}

impl ModelInfo {
    pub fn filename(&self) -> String {
        format!("ggml-{}.bin", self.name)
    }

    pub fn url(&self) -> String {
        format!("{}/{}", MODEL_BASE_URL, self.filename())
    }
}

pub static AVAILABLE_MODELS: [ModelInfo; 12] = [
    ModelInfo { name: "tiny", size_mb: 75.0 },
    ModelInfo { name: "tiny.en", size_mb: 75.0 },
    ModelInfo { name: "base", size_mb: 142.0 },
    ModelInfo { name: "base.en", size_mb: 142.0 },
    ModelInfo { name: "small", size_mb: 466.0 },
    ModelInfo { name: "small.en", size_mb: 466.0 },
    ModelInfo { name: "medium", size_mb: 1500.0 },
    ModelInfo { name: "medium.en", size_mb: 1500.0 },
    ModelInfo { name: "large-v1", size_mb: 2900.0 },
    ModelInfo { name: "large-v2", size_mb: 2900.0 },
    ModelInfo { name: "large-v3", size_mb: 2900.0 },
    ModelInfo { name: "large-v3-turbo", size_mb: 1500.0 },
];

/// Map display names used by earlier releases onto catalog names.
pub fn canonical_name(name: &str) -> &str {
    match name {
        "WhisperLargeV3" => "large-v3",
        "WhisperLargeV3-Turbo" => "large-v3-turbo",
        other => other,
    }
}

pub fn find_model(name: &str) -> Option<&'static ModelInfo> {
    let name = canonical_name(name);
    AVAILABLE_MODELS.iter().find(|m| m.name == name)
}

/// Locates and downloads ggml model files in a models directory
pub struct ModelManager {
    models_dir: PathBuf,
}

impl ModelManager {
    pub fn new<P: Into<PathBuf>>(models_dir: P) -> Self {
        Self { models_dir: models_dir.into() }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Resolve a model name to the file the engine should load.
    ///
    /// Anything that already looks like a path is returned as-is.
    pub fn resolve_model_path(&self, model: &str) -> PathBuf {
        if model.contains('/') || model.contains('\\') || model.ends_with(".bin") {
            return PathBuf::from(model);
        }
        self.models_dir.join(format!("ggml-{}.bin", canonical_name(model)))
    }

    pub fn is_downloaded(&self, model: &ModelInfo) -> bool {
        self.models_dir.join(model.filename()).is_file()
    }

    pub async fn download_model(&self, model: &ModelInfo) -> Result<PathBuf> {
        let local_path = self.models_dir.join(model.filename());

        if local_path.exists() {
            info!("Model {} already exists at {}", model.name, local_path.display());
            return Ok(local_path);
        }

        async_fs::create_dir_all(&self.models_dir).await?;
        info!("Downloading {} model ({:.1} MB)...", model.name, model.size_mb);

        let client = Client::builder()
            .user_agent(concat!("whispersubs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let mut response = client.get(model.url()).send().await?;

        if !response.status().is_success() {
            return Err(SubsError::Config(format!(
                "Failed to download model {}: HTTP {}",
                model.name,
                response.status()
            )));
        }

        let total = response
            .content_length()
            .unwrap_or((model.size_mb * 1_000_000.0) as u64);
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .map_err(|e| SubsError::Config(format!("Invalid progress template: {}", e)))?
                .progress_chars("#>-"),
        );

        // Download next to the target and rename once complete
        let temp_path = local_path.with_extension("tmp");
        let transfer = async {
            let mut file = async_fs::File::create(&temp_path).await?;
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
                pb.inc(chunk.len() as u64);
            }
            file.flush().await?;
            Ok::<(), SubsError>(())
        };
        commit_download(&temp_path, &local_path, transfer).await?;

        pb.finish_with_message(format!("Downloaded {}", model.name));
        info!("Successfully downloaded {} to {}", model.name, local_path.display());

        Ok(local_path)
    }
}

/// Move a finished transfer into place, or delete the partial file if it failed.
async fn commit_download<F>(temp_path: &Path, local_path: &Path, transfer: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    if let Err(e) = transfer.await {
        match async_fs::remove_file(temp_path).await {
            Ok(()) => info!("Removed partial download {}", temp_path.display()),
            Err(rm) if rm.kind() == std::io::ErrorKind::NotFound => {}
            Err(rm) => warn!("Failed to remove partial download {}: {}", temp_path.display(), rm),
        }
        return Err(e);
    }

    async_fs::rename(temp_path, local_path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_catalog() {
        assert_eq!(find_model("WhisperLargeV3").unwrap().name, "large-v3");
        assert_eq!(find_model("WhisperLargeV3-Turbo").unwrap().name, "large-v3-turbo");
        assert_eq!(find_model("small").unwrap().filename(), "ggml-small.bin");
        assert!(find_model("CrisperWhisper").is_none());
    }

    #[test]
    fn test_resolve_model_path() {
        let manager = ModelManager::new("/models");
        assert_eq!(manager.resolve_model_path("base"), PathBuf::from("/models/ggml-base.bin"));
        assert_eq!(
            manager.resolve_model_path("WhisperLargeV3"),
            PathBuf::from("/models/ggml-large-v3.bin")
        );
        assert_eq!(
            manager.resolve_model_path("/opt/custom.bin"),
            PathBuf::from("/opt/custom.bin")
        );
    }

    #[test]
    fn test_is_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path());
        let tiny = find_model("tiny").unwrap();

        assert!(!manager.is_downloaded(tiny));
        std::fs::write(dir.path().join("ggml-tiny.bin"), b"weights").unwrap();
        assert!(manager.is_downloaded(tiny));
    }

    #[test]
    fn test_model_url() {
        assert_eq!(
            find_model("tiny.en").unwrap().url(),
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.en.bin"
        );
    }

    #[tokio::test]
    async fn test_failed_transfer_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = dir.path().join("ggml-tiny.tmp");
        let local_path = dir.path().join("ggml-tiny.bin");

        let transfer = async {
            tokio::fs::write(&temp_path, b"half of the weights").await?;
            Err::<(), SubsError>(SubsError::Config("connection reset".to_string()))
        };
        let err = commit_download(&temp_path, &local_path, transfer).await.unwrap_err();

        assert!(matches!(err, SubsError::Config(_)));
        assert!(!temp_path.exists());
        assert!(!local_path.exists());
    }

    #[tokio::test]
    async fn test_completed_transfer_is_renamed_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = dir.path().join("ggml-tiny.tmp");
        let local_path = dir.path().join("ggml-tiny.bin");

        let transfer = async {
            tokio::fs::write(&temp_path, b"weights").await?;
            Ok::<(), SubsError>(())
        };
        commit_download(&temp_path, &local_path, transfer).await.unwrap();

        assert!(!temp_path.exists());
        assert_eq!(std::fs::read(&local_path).unwrap(), b"weights");
    }
}
