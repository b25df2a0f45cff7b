//! Data structures exchanged with the metadata/download service

use crate::utils::format::format_file_size;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Video information as returned by `POST /video/info`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub formats: Vec<Format>,
    #[serde(default)]
    pub video_id: Option<String>,
}

/// One encoding variant of a video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Format {
    pub format_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resolution: String,
    pub ext: String,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub format_note: Option<String>,
}

impl Format {
    /// Label shown in format pickers, e.g. `720p • MP4 • 1.50 MB (hd)`
    pub fn display_label(&self) -> String {
        let resolution = if self.resolution.is_empty() {
            "unknown"
        } else {
            &self.resolution
        };
        let mut label = format!(
            "{} • {} • {}",
            resolution,
            self.ext.to_uppercase(),
            format_file_size(self.filesize)
        );
        if let Some(note) = self.format_note.as_deref().filter(|n| !n.is_empty()) {
            label.push_str(&format!(" ({})", note));
        }
        label
    }
}

// The service sends `null` for fields the extractor could not fill.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `POST /video/info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoRequest {
    pub url: String,
}

/// Body of `POST /video/download`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: String,
}

/// Response of `POST /video/download`
///
/// Current services return `filename`; older ones hand back a direct
/// `download_url` together with `title` and `ext`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadResponse {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
}

/// Failure body used by the service for every non-2xx response
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The detail as text; structured details are rendered as JSON.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// A prepared download the user can retrieve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadResult {
    /// Opaque locator for the produced file
    pub artifact_reference: String,
    pub format_id: String,
    pub title: Option<String>,
    pub extension: Option<String>,
    pub prepared_at: DateTime<Utc>,
}
