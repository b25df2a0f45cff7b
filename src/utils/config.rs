//! Service configuration

use crate::utils::error::VidsaverError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the service base address
pub const BACKEND_URL_VAR: &str = "VIDSAVER_BACKEND_URL";

/// Environment variable holding the optional per-request timeout in seconds
pub const REQUEST_TIMEOUT_VAR: &str = "VIDSAVER_REQUEST_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Settings for reaching the metadata/download service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Base address, without a trailing slash
    pub base_url: String,

    /// Per-request timeout; `None` waits for the service indefinitely
    pub request_timeout: Option<Duration>,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
            user_agent: format!("vidsaver/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ServiceConfig {
    /// Build a config pointing at `base_url`, with defaults for everything else.
    pub fn new(base_url: impl Into<String>) -> Result<Self, VidsaverError> {
        let config = Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Result<Self, VidsaverError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, VidsaverError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(BACKEND_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config.base_url = normalize_base_url(&url);
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                VidsaverError::Config(format!("{} must be a whole number of seconds", REQUEST_TIMEOUT_VAR))
            })?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Enforce that the base address is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), VidsaverError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(VidsaverError::Config(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Full URL of an endpoint below the base address.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Retrieval locator for a file the service has prepared.
    pub fn file_url(&self, filename: &str) -> String {
        self.endpoint(&format!("video/file/{}", filename))
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
