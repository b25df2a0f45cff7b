//! HTTP client for the metadata/download service
//!
//! Speaks the JSON contract of `POST {base}/video/info` and
//! `POST {base}/video/download`. Failures carry the service's `detail`
//! message when the body has one.

use crate::service::models::{DownloadRequest, DownloadResponse, ErrorBody, InfoRequest, VideoMetadata};
use crate::service::traits::VideoService;
use crate::utils::config::ServiceConfig;
use crate::utils::error::ServiceError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// `reqwest`-backed implementation of [`VideoService`]
#[derive(Debug, Clone)]
pub struct HttpVideoService {
    client: Client,
    config: ServiceConfig,
}

#[derive(Debug, Deserialize)]
struct RootResponse {
    #[serde(default)]
    message: Option<String>,
}

impl HttpVideoService {
    /// Build a client for the given configuration
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        decode(response).await
    }
}

fn map_transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Network(err)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;

    if !status.is_success() {
        let detail = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message());
        warn!("Service responded {} (detail: {:?})", status, detail);
        return Err(ServiceError::Status {
            status: status.as_u16(),
            detail,
        });
    }

    serde_json::from_slice(&body).map_err(|e| {
        error!("Failed to decode service response: {}", e);
        ServiceError::InvalidResponse(e.to_string())
    })
}

#[async_trait]
impl VideoService for HttpVideoService {
    fn id(&self) -> &'static str {
        "http"
    }

    async fn fetch_info(&self, url: &str) -> Result<VideoMetadata, ServiceError> {
        let request = InfoRequest {
            url: url.to_string(),
        };
        self.post_json("video/info", &request).await
    }

    async fn prepare_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, ServiceError> {
        self.post_json("video/download", request).await
    }

    fn file_url(&self, filename: &str) -> String {
        self.config.file_url(filename)
    }

    async fn health(&self) -> Result<String, ServiceError> {
        let url = self.config.endpoint("");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_transport_error)?;
        let root: RootResponse = decode(response).await?;
        Ok(root.message.unwrap_or_else(|| "ok".to_string()))
    }
}
