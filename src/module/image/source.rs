use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reasons why an artifact could not be fetched and stored
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP client could not be constructed
    #[error("unable to build HTTP client")]
    Client(#[source] reqwest::Error),
    /// Request failed or the body could not be read
    #[error("failed to download image: {0}")]
    Request(#[from] reqwest::Error),
    /// Source answered with a non-success status
    #[error("failed to download image: HTTP {}", .0.as_u16())]
    Status(StatusCode),
    /// Artifact could not be written to disk
    #[error("failed to save image: {0}")]
    Io(#[from] std::io::Error),
}

/// Origin of a cached artifact
#[async_trait]
pub trait ArtifactSource {
    /// Downloads the artifact into the given writer and returns the number of bytes written
    async fn fetch_into(
        &self,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, FetchError>;
}

/// [`ArtifactSource`] downloading from a fixed URL
pub struct HttpArtifactSource {
    client: Client,
    url: String,
}

impl HttpArtifactSource {
    /// Creates a new source for the given URL
    pub fn new(url: String) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, url })
    }

    /// Location the artifact is downloaded from
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ArtifactSource for HttpArtifactSource {
    async fn fetch_into(
        &self,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let mut written = 0;
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        writer.flush().await?;

        Ok(written)
    }
}
