//! In-memory state of one acquisition workflow

use crate::service::models::{DownloadResult, Format, VideoMetadata};
use serde::Serialize;
use uuid::Uuid;

/// Where the workflow currently stands, derived from the session fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    FetchingMetadata,
    MetadataReady,
    Downloading,
    DownloadReady,
}

/// Session state
///
/// Invariant: `selected_format`, when set, names a format of `metadata`.
/// A new metadata fetch replaces the whole session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub url: String,
    pub metadata: Option<VideoMetadata>,
    pub selected_format: Option<String>,
    pub download: Option<DownloadResult>,
    pub fetching: bool,
    pub downloading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl Session {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            metadata: None,
            selected_format: None,
            download: None,
            fetching: false,
            downloading: false,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.fetching {
            Phase::FetchingMetadata
        } else if self.downloading {
            Phase::Downloading
        } else if self.download.is_some() {
            Phase::DownloadReady
        } else if self.metadata.is_some() {
            Phase::MetadataReady
        } else {
            Phase::Idle
        }
    }

    /// The selected format, if it exists in the current metadata
    pub fn selected(&self) -> Option<&Format> {
        let id = self.selected_format.as_deref()?;
        self.metadata
            .as_ref()?
            .formats
            .iter()
            .find(|f| f.format_id == id)
    }

    /// Store freshly fetched metadata and select its first format.
    pub(crate) fn accept_metadata(&mut self, metadata: VideoMetadata) {
        self.selected_format = metadata.formats.first().map(|f| f.format_id.clone());
        self.metadata = Some(metadata);
        self.download = None;
    }
}
