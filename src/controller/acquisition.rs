//! Acquisition controller: metadata fetch, format selection, download request
//!
//! At most one request of each kind is in flight. Issuing a new one cancels
//! and replaces the old one, and a new metadata fetch also cancels any
//! pending download because its result would belong to the discarded session.
//! Each request carries a generation number; a completing request only writes
//! into the session while its generation is still the current one.

use crate::controller::session::{Phase, Session};
use crate::service::models::{DownloadRequest, DownloadResponse, DownloadResult, VideoMetadata};
use crate::service::traits::VideoService;
use crate::utils::error::{RequestKind, VidsaverError};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

const FETCH_FAILED: &str = "Failed to fetch video info";
const DOWNLOAD_FAILED: &str = "Failed to prepare download";

/// Handle on a request that has not completed yet
struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

struct State {
    session: Session,
    metadata_request: Option<InFlight>,
    download_request: Option<InFlight>,
    next_generation: u64,
}

impl State {
    fn slot(&mut self, kind: RequestKind) -> &mut Option<InFlight> {
        match kind {
            RequestKind::Metadata => &mut self.metadata_request,
            RequestKind::Download => &mut self.download_request,
        }
    }

    fn cancel(&mut self, kind: RequestKind) {
        if let Some(flight) = self.slot(kind).take() {
            debug!("Cancelling in-flight {} request #{}", kind, flight.generation);
            flight.cancel.cancel();
            match kind {
                RequestKind::Metadata => self.session.fetching = false,
                RequestKind::Download => self.session.downloading = false,
            }
        }
    }

    fn begin(&mut self, kind: RequestKind) -> (u64, CancellationToken) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let cancel = CancellationToken::new();
        *self.slot(kind) = Some(InFlight {
            generation,
            cancel: cancel.clone(),
        });
        (generation, cancel)
    }

    /// Clear the slot if `generation` still owns it; false means superseded.
    fn finish(&mut self, kind: RequestKind, generation: u64) -> bool {
        let current = matches!(self.slot(kind), Some(flight) if flight.generation == generation);
        if current {
            *self.slot(kind) = None;
        }
        current
    }
}

struct Inner {
    service: Arc<dyn VideoService>,
    state: Mutex<State>,
    updates: watch::Sender<Session>,
}

/// Drives one acquisition session against a [`VideoService`]
///
/// Cloning yields another handle on the same session.
#[derive(Clone)]
pub struct AcquisitionController {
    inner: Arc<Inner>,
}

impl AcquisitionController {
    pub fn new(service: Arc<dyn VideoService>) -> Self {
        let (updates, _) = watch::channel(Session::default());
        Self {
            inner: Arc::new(Inner {
                service,
                updates,
                state: Mutex::new(State {
                    session: Session::default(),
                    metadata_request: None,
                    download_request: None,
                    next_generation: 0,
                }),
            }),
        }
    }

    /// Copy of the current session, for rendering
    pub async fn snapshot(&self) -> Session {
        self.inner.state.lock().await.session.clone()
    }

    pub async fn phase(&self) -> Phase {
        self.inner.state.lock().await.session.phase()
    }

    /// Receiver that sees every session change, including busy flags
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.updates.subscribe()
    }

    fn publish(&self, state: &State) {
        self.inner.updates.send_replace(state.session.clone());
    }

    /// Fetch metadata for `url`, replacing the whole session.
    ///
    /// On success the first format becomes the selection.
    pub async fn request_metadata(&self, url: &str) -> Result<VideoMetadata, VidsaverError> {
        self.begin_metadata(url).await?.complete().await
    }

    /// Reset the session for `url` and claim the metadata slot.
    ///
    /// Any earlier request is superseded as soon as this returns, so callers
    /// that spawn the returned request keep their command order.
    pub async fn begin_metadata(&self, url: &str) -> Result<PendingMetadata, VidsaverError> {
        let url = url.trim().to_string();
        if url.is_empty() {
            return Err(VidsaverError::Validation(
                "Please enter a video URL".to_string(),
            ));
        }

        let mut state = self.inner.state.lock().await;
        state.cancel(RequestKind::Metadata);
        state.cancel(RequestKind::Download);
        state.session = Session::new(url.clone());
        state.session.fetching = true;
        let (generation, cancel) = state.begin(RequestKind::Metadata);
        self.publish(&state);

        Ok(PendingMetadata {
            controller: self.clone(),
            url,
            generation,
            cancel,
            session_id: state.session.id,
        })
    }

    /// Choose the format to download. Membership is checked at download time.
    pub async fn select_format(&self, format_id: &str) -> Result<(), VidsaverError> {
        let format_id = format_id.trim();
        if format_id.is_empty() {
            return Err(VidsaverError::Validation("No format given".to_string()));
        }

        let mut state = self.inner.state.lock().await;
        if state.session.metadata.is_none() {
            return Err(VidsaverError::Validation("No video loaded".to_string()));
        }
        debug!(session = %state.session.id, "Selected format {}", format_id);
        state.session.selected_format = Some(format_id.to_string());
        self.publish(&state);
        Ok(())
    }

    /// Ask the service to prepare the selected format for retrieval.
    pub async fn request_download(&self) -> Result<DownloadResult, VidsaverError> {
        self.begin_download().await?.complete().await
    }

    /// Validate the selection and claim the download slot.
    ///
    /// Any earlier download request is superseded as soon as this returns.
    pub async fn begin_download(&self) -> Result<PendingDownload, VidsaverError> {
        let mut state = self.inner.state.lock().await;

        let format_id = state
            .session
            .selected_format
            .clone()
            .ok_or_else(|| VidsaverError::Validation("No format selected".to_string()))?;
        let format = state.session.selected().cloned().ok_or_else(|| {
            VidsaverError::Validation(format!("Format {} is not available", format_id))
        })?;
        let title = state.session.metadata.as_ref().map(|m| m.title.clone());

        state.cancel(RequestKind::Download);
        state.session.download = None;
        state.session.downloading = true;
        let (generation, cancel) = state.begin(RequestKind::Download);
        self.publish(&state);

        let request = DownloadRequest {
            url: state.session.url.clone(),
            format_id,
        };
        Ok(PendingDownload {
            controller: self.clone(),
            request,
            generation,
            cancel,
            session_id: state.session.id,
            fallback_title: title,
            fallback_ext: format.ext,
        })
    }

    /// Drop the session and cancel anything in flight.
    pub async fn reset(&self) {
        let mut state = self.inner.state.lock().await;
        state.cancel(RequestKind::Metadata);
        state.cancel(RequestKind::Download);
        state.session = Session::default();
        self.publish(&state);
    }

    fn artifact_reference(&self, response: &DownloadResponse) -> Option<String> {
        if let Some(filename) = response.filename.as_deref().filter(|f| !f.is_empty()) {
            return Some(self.inner.service.file_url(filename));
        }
        response
            .download_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(str::to_string)
    }
}

/// A metadata request that has claimed its slot but not yet hit the network
#[must_use = "the request does nothing until completed"]
pub struct PendingMetadata {
    controller: AcquisitionController,
    url: String,
    generation: u64,
    cancel: CancellationToken,
    session_id: Uuid,
}

impl PendingMetadata {
    /// Send the request and store its outcome if it is still current.
    pub async fn complete(self) -> Result<VideoMetadata, VidsaverError> {
        let Self {
            controller,
            url,
            generation,
            cancel,
            session_id,
        } = self;

        info!(session = %session_id, "Fetching metadata for {}", url);

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(session = %session_id, "Metadata request #{} superseded", generation);
                return Err(VidsaverError::Superseded(RequestKind::Metadata));
            }
            outcome = controller.inner.service.fetch_info(&url) => outcome,
        };

        let mut state = controller.inner.state.lock().await;
        if !state.finish(RequestKind::Metadata, generation) {
            return Err(VidsaverError::Superseded(RequestKind::Metadata));
        }
        state.session.fetching = false;

        let result = match outcome {
            Ok(metadata) => {
                info!(
                    session = %session_id,
                    "Received '{}' with {} formats",
                    metadata.title,
                    metadata.formats.len()
                );
                state.session.accept_metadata(metadata.clone());
                Ok(metadata)
            }
            Err(e) => {
                warn!(session = %session_id, "Metadata request failed: {}", e);
                Err(e.into_remote(FETCH_FAILED))
            }
        };
        controller.publish(&state);
        result
    }
}

/// A download request that has claimed its slot but not yet hit the network
#[must_use = "the request does nothing until completed"]
pub struct PendingDownload {
    controller: AcquisitionController,
    request: DownloadRequest,
    generation: u64,
    cancel: CancellationToken,
    session_id: Uuid,
    fallback_title: Option<String>,
    fallback_ext: String,
}

impl PendingDownload {
    /// Send the request and store the prepared file if it is still current.
    pub async fn complete(self) -> Result<DownloadResult, VidsaverError> {
        let Self {
            controller,
            request,
            generation,
            cancel,
            session_id,
            fallback_title,
            fallback_ext,
        } = self;

        info!(
            session = %session_id,
            "Requesting download of format {} for {}",
            request.format_id,
            request.url
        );

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(session = %session_id, "Download request #{} superseded", generation);
                return Err(VidsaverError::Superseded(RequestKind::Download));
            }
            outcome = controller.inner.service.prepare_download(&request) => outcome,
        };

        let mut state = controller.inner.state.lock().await;
        if !state.finish(RequestKind::Download, generation) {
            return Err(VidsaverError::Superseded(RequestKind::Download));
        }
        state.session.downloading = false;

        let result = outcome
            .map_err(|e| {
                warn!(session = %session_id, "Download request failed: {}", e);
                e.into_remote(DOWNLOAD_FAILED)
            })
            .and_then(|response| {
                let artifact_reference =
                    controller.artifact_reference(&response).ok_or_else(|| {
                        warn!(session = %session_id, "Download response carried no file reference");
                        VidsaverError::Remote(DOWNLOAD_FAILED.to_string())
                    })?;
                Ok(DownloadResult {
                    artifact_reference,
                    format_id: request.format_id,
                    title: response.title.or(fallback_title),
                    extension: response.ext.or(Some(fallback_ext)),
                    prepared_at: Utc::now(),
                })
            });

        if let Ok(download) = &result {
            info!(session = %session_id, "Download ready at {}", download.artifact_reference);
            state.session.download = Some(download.clone());
        }
        controller.publish(&state);
        result
    }
}
