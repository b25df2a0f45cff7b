//! Scripted in-memory service for unit tests

use crate::service::models::{DownloadRequest, DownloadResponse, Format, VideoMetadata};
use crate::service::traits::VideoService;
use crate::utils::error::ServiceError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const BASE: &str = "http://mock.local/api";

struct Scripted<T> {
    delay: Option<Duration>,
    result: Result<T, ServiceError>,
}

#[derive(Default)]
pub struct MockService {
    infos: Mutex<VecDeque<Scripted<VideoMetadata>>>,
    infos_by_url: Mutex<HashMap<String, VecDeque<Scripted<VideoMetadata>>>>,
    downloads: Mutex<VecDeque<Scripted<DownloadResponse>>>,
    info_calls: AtomicUsize,
    download_calls: AtomicUsize,
    download_requests: Mutex<Vec<DownloadRequest>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_info(&self, result: Result<VideoMetadata, ServiceError>) -> &Self {
        self.push_info_delayed(result, None)
    }

    pub fn push_info_delayed(
        &self,
        result: Result<VideoMetadata, ServiceError>,
        delay: Option<Duration>,
    ) -> &Self {
        self.infos
            .lock()
            .unwrap()
            .push_back(Scripted { delay, result });
        self
    }

    /// Script a response for one URL only; takes precedence over the shared queue.
    pub fn push_info_for(
        &self,
        url: &str,
        result: Result<VideoMetadata, ServiceError>,
        delay: Option<Duration>,
    ) -> &Self {
        self.infos_by_url
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(Scripted { delay, result });
        self
    }

    pub fn push_download(&self, result: Result<DownloadResponse, ServiceError>) -> &Self {
        self.push_download_delayed(result, None)
    }

    pub fn push_download_delayed(
        &self,
        result: Result<DownloadResponse, ServiceError>,
        delay: Option<Duration>,
    ) -> &Self {
        self.downloads
            .lock()
            .unwrap()
            .push_back(Scripted { delay, result });
        self
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn download_requests(&self) -> Vec<DownloadRequest> {
        self.download_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoService for MockService {
    fn id(&self) -> &'static str {
        "mock"
    }

    async fn fetch_info(&self, url: &str) -> Result<VideoMetadata, ServiceError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        let keyed = self
            .infos_by_url
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());
        let scripted = keyed
            .or_else(|| self.infos.lock().unwrap().pop_front())
            .expect("unexpected fetch_info call");
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.result
    }

    async fn prepare_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, ServiceError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        self.download_requests.lock().unwrap().push(request.clone());
        let scripted = self
            .downloads
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected prepare_download call");
        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.result
    }

    fn file_url(&self, filename: &str) -> String {
        format!("{}/video/file/{}", BASE, filename)
    }
}

pub fn format(id: &str, resolution: &str) -> Format {
    Format {
        format_id: id.to_string(),
        resolution: resolution.to_string(),
        ext: "mp4".to_string(),
        filesize: None,
        format_note: None,
    }
}

pub fn metadata(title: &str, formats: Vec<Format>) -> VideoMetadata {
    VideoMetadata {
        title: title.to_string(),
        thumbnail: format!("https://img.local/{}.jpg", title),
        duration: 212,
        formats,
        video_id: None,
    }
}

pub fn filename(name: &str) -> DownloadResponse {
    DownloadResponse {
        filename: Some(name.to_string()),
        ..Default::default()
    }
}

pub fn detail_error(status: u16, detail: &str) -> ServiceError {
    ServiceError::Status {
        status,
        detail: Some(detail.to_string()),
    }
}
