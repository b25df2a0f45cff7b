pub mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod models;
pub mod traits;

pub use http::HttpVideoService;
pub use models::{DownloadRequest, DownloadResponse, DownloadResult, Format, VideoMetadata};
pub use traits::VideoService;
