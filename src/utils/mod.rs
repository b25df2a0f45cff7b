//! Utility modules for error handling, configuration and display formatting

pub mod config;
pub mod error;
pub mod format;

// Re-export for convenience
pub use config::ServiceConfig;
pub use error::{RequestKind, ServiceError, VidsaverError};
pub use format::{format_duration, format_file_size, UNKNOWN_SIZE};
