pub mod acquisition;
pub mod session;

pub use acquisition::{AcquisitionController, PendingDownload, PendingMetadata};
pub use session::{Phase, Session};
