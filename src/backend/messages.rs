use crate::service::{DownloadResult, VideoMetadata};

/// Commands sent from the presentation layer to the backend
#[derive(Debug, Clone)]
pub enum BackendCommand {
    FetchInfo {
        url: String,
    },
    SelectFormat(String),
    Download,
    Reset,
    // System
    Shutdown,
}

/// Events sent from the backend to the presentation layer
#[derive(Debug, Clone)]
pub enum BackendEvent {
    MetadataReady(VideoMetadata),
    FormatSelected(String),
    DownloadReady(DownloadResult),

    /// A user-facing message describing a failed action
    Notification(String),
}
