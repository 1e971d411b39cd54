use super::fetcher::ModelFetcher;
use crate::error::ModelError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

/// Describes one downloadable model asset.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    /// File name under the models directory.
    pub name: String,
    /// Download URLs, tried in order.
    pub urls: Vec<String>,
    /// Expected file size in bytes.
    pub expected_bytes: u64,
    /// Accepted deviation from `expected_bytes` (fraction, e.g. 0.05).
    pub size_tolerance: f64,
}

impl ModelSpec {
    /// The default speech model.
    pub fn whisper_tiny_en() -> Self {
        Self {
            name: "ggml-tiny.en.bin".to_string(),
            urls: vec![
                "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.en.bin"
                    .to_string(),
                "https://github.com/ggerganov/whisper.cpp/releases/download/v1.5.4/ggml-tiny.en.bin"
                    .to_string(),
            ],
            expected_bytes: 75 * 1024 * 1024,
            size_tolerance: 0.05,
        }
    }

    fn accepted_range(&self) -> (u64, u64) {
        let min = (self.expected_bytes as f64 * (1.0 - self.size_tolerance)) as u64;
        let max = (self.expected_bytes as f64 * (1.0 + self.size_tolerance)) as u64;
        (min, max)
    }
}

/// Ensures the model file exists locally, verified, downloading as needed.
///
/// Readiness is re-validated against the file on every check; the manager
/// never trusts a stale "downloaded" flag. Downloads land at a `.partial`
/// path and are renamed into place only after verification, so a crash or
/// cancellation mid-transfer can never leave a ready-named partial file.
pub struct ModelAssetManager {
    spec: ModelSpec,
    models_dir: PathBuf,
    fetcher: Arc<dyn ModelFetcher>,
    /// Single-flight: concurrent `ensure_ready` callers for this model
    /// serialize here and observe the winner's result.
    download: Mutex<()>,
    progress: watch::Sender<u8>,
}

impl ModelAssetManager {
    pub fn new(spec: ModelSpec, models_dir: PathBuf, fetcher: Arc<dyn ModelFetcher>) -> Self {
        let (progress, _) = watch::channel(0u8);
        Self {
            spec,
            models_dir,
            fetcher,
            download: Mutex::new(()),
            progress,
        }
    }

    /// Final path of the model file.
    pub fn path(&self) -> PathBuf {
        self.models_dir.join(&self.spec.name)
    }

    fn partial_path(&self) -> PathBuf {
        self.models_dir.join(format!("{}.partial", self.spec.name))
    }

    /// Download progress, 0-100. Callers sample or discard at their own
    /// cadence.
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    /// True iff the model file exists and matches the expected descriptor.
    /// Cheap and synchronous; safe to call before every session start.
    pub fn is_ready(&self) -> bool {
        self.validate(&self.path()).is_ok()
    }

    fn validate(&self, path: &std::path::Path) -> Result<(), ModelError> {
        let meta = std::fs::metadata(path)
            .map_err(|_| ModelError::Corrupt(format!("missing file {:?}", path)))?;
        if !meta.is_file() {
            return Err(ModelError::Corrupt(format!("not a file: {:?}", path)));
        }
        let (min, max) = self.spec.accepted_range();
        let size = meta.len();
        if size < min || size > max {
            return Err(ModelError::Corrupt(format!(
                "size {} outside {}..{} for {}",
                size, min, max, self.spec.name
            )));
        }
        Ok(())
    }

    /// Idempotent: returns immediately, with no network access, when the
    /// model is already present and valid. On verification failure the
    /// corrupt artifact is deleted and the download retried once before
    /// `ModelError::Corrupt` surfaces. A failed attempt never touches a
    /// previously-ready model file.
    pub async fn ensure_ready(&self) -> Result<(), ModelError> {
        if self.is_ready() {
            self.progress.send_replace(100);
            return Ok(());
        }

        let _guard = self.download.lock().await;

        // A concurrent caller may have finished while we waited.
        if self.is_ready() {
            self.progress.send_replace(100);
            return Ok(());
        }

        match self.download_once().await {
            Ok(()) => Ok(()),
            Err(ModelError::Corrupt(msg)) => {
                warn!("Model {} failed verification ({}), retrying once", self.spec.name, msg);
                self.download_once().await
            }
            Err(e) => Err(e),
        }
    }

    async fn download_once(&self) -> Result<(), ModelError> {
        tokio::fs::create_dir_all(&self.models_dir)
            .await
            .map_err(|e| {
                ModelError::Unavailable(format!("create {:?}: {}", self.models_dir, e))
            })?;

        let partial = self.partial_path();
        if tokio::fs::try_exists(&partial).await.unwrap_or(false) {
            let _ = tokio::fs::remove_file(&partial).await;
        }

        self.progress.send_replace(0);

        let mut last_err: Option<ModelError> = None;
        for (i, url) in self.spec.urls.iter().enumerate() {
            info!(
                "Downloading model {} (url {}/{})",
                self.spec.name,
                i + 1,
                self.spec.urls.len()
            );

            let expected = self.spec.expected_bytes;
            let progress = &self.progress;
            let report = move |got: u64, total: Option<u64>| {
                let denom = total.unwrap_or(expected).max(1);
                let pct = ((got * 100 / denom).min(99)) as u8;
                progress.send_if_modified(|p| {
                    if *p != pct {
                        *p = pct;
                        true
                    } else {
                        false
                    }
                });
            };

            match self.fetcher.fetch(url, &partial, &report).await {
                Ok(()) => {
                    if let Err(e) = self.validate(&partial) {
                        let _ = tokio::fs::remove_file(&partial).await;
                        return Err(e);
                    }

                    tokio::fs::rename(&partial, self.path()).await.map_err(|e| {
                        ModelError::Unavailable(format!("publish model: {}", e))
                    })?;

                    self.progress.send_replace(100);
                    info!("Model {} ready at {:?}", self.spec.name, self.path());
                    return Ok(());
                }
                Err(e) => {
                    warn!("Model download from {} failed: {}", url, e);
                    let _ = tokio::fs::remove_file(&partial).await;
                    last_err = Some(e);
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| ModelError::Unavailable("no download urls configured".into())))
    }
}
