use crate::error::ModelError;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Progress callback: cumulative bytes written, total if known.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// Transfers a model asset to local disk.
///
/// The manager owns verification and atomic publication; a fetcher only
/// streams bytes to the destination it is given.
#[async_trait]
pub trait ModelFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        on_progress: ProgressFn<'_>,
    ) -> Result<(), ModelError>;
}

/// Streaming HTTP fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        on_progress: ProgressFn<'_>,
    ) -> Result<(), ModelError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ModelError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ModelError::Unavailable(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let total = response.content_length();
        let mut stream = response.bytes_stream();

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| ModelError::Unavailable(format!("create {:?}: {}", dest, e)))?;

        let mut downloaded = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ModelError::Unavailable(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| ModelError::Unavailable(format!("write {:?}: {}", dest, e)))?;
            downloaded += chunk.len() as u64;
            on_progress(downloaded, total);
        }

        file.flush()
            .await
            .map_err(|e| ModelError::Unavailable(format!("flush {:?}: {}", dest, e)))?;

        Ok(())
    }
}
