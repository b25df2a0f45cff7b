//! Error handling for VidSaver

use std::fmt;
use thiserror::Error;

/// Which kind of remote request an error or cancellation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Metadata,
    Download,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Metadata => f.write_str("metadata"),
            RequestKind::Download => f.write_str("download"),
        }
    }
}

/// Main error type for VidSaver
///
/// Every controller operation reports failures through this type. The
/// `Display` output of `Validation` and `Remote` is the user-facing message.
#[derive(Debug, Error)]
pub enum VidsaverError {
    /// A precondition failed locally; nothing was sent to the service.
    #[error("{0}")]
    Validation(String),

    /// The service rejected the request or could not be reached.
    #[error("{0}")]
    Remote(String),

    /// A newer request of the same kind replaced this one while in flight.
    #[error("{0} request superseded by a newer one")]
    Superseded(RequestKind),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl VidsaverError {
    /// Whether this error should be shown to the user.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, VidsaverError::Superseded(_))
    }
}

/// Errors raised by the transport layer talking to the remote service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Service returned HTTP {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out")]
    Timeout,
}

impl ServiceError {
    /// Message supplied by the service in its `{ "detail": ... }` body, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ServiceError::Status {
                detail: Some(detail),
                ..
            } if !detail.is_empty() => Some(detail),
            _ => None,
        }
    }

    /// Normalize into a [`VidsaverError::Remote`], preferring the service detail.
    pub fn into_remote(self, fallback: &str) -> VidsaverError {
        match self.detail() {
            Some(detail) => VidsaverError::Remote(detail.to_string()),
            None => VidsaverError::Remote(fallback.to_string()),
        }
    }
}
