//! VidSaver library

pub mod backend;
pub mod clipboard;
pub mod controller;
pub mod service;
pub mod utils;

// Re-export main types for easier use
pub use backend::{BackendActor, BackendCommand, BackendEvent};
pub use controller::{AcquisitionController, Phase, Session};
pub use service::{DownloadResult, Format, HttpVideoService, VideoMetadata, VideoService};
pub use utils::{format_file_size, ServiceConfig, VidsaverError};
