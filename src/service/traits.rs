use crate::service::models::{DownloadRequest, DownloadResponse, VideoMetadata};
use crate::utils::error::ServiceError;
use async_trait::async_trait;

/// Remote metadata/download service
///
/// This trait isolates the controller from the transport, so tests can
/// substitute a scripted double for the HTTP client.
#[async_trait]
pub trait VideoService: Send + Sync {
    /// Returns an identifier for logging (e.g., "http")
    fn id(&self) -> &'static str;

    /// Fetches the metadata and available formats for a video URL
    async fn fetch_info(&self, url: &str) -> Result<VideoMetadata, ServiceError>;

    /// Asks the service to prepare a download of one format
    async fn prepare_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, ServiceError>;

    /// Turns a prepared filename into a retrieval locator
    fn file_url(&self, filename: &str) -> String;

    /// Checks that the service is reachable (default: assume it is)
    async fn health(&self) -> Result<String, ServiceError> {
        Ok(format!("{} service", self.id()))
    }
}
