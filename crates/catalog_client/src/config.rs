//! Emitter configuration.
//!
//! Resolution order: built-in defaults, then environment, then whatever the
//! caller sets through the builder methods.

use std::time::Duration;

use catalog_types::ArgumentError;
use url::Url;

pub const DEFAULT_GMS_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_GMS_URL: &str = "CATALOG_GMS_URL";
pub const ENV_TIMEOUT_SECS: &str = "CATALOG_TIMEOUT_SECS";

/// Configuration for the REST emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterConfig {
    /// Base URL of the catalog's metadata service.
    pub gms_url: String,

    /// Per-request timeout.
    pub timeout_secs: u64,

    /// Extra headers sent with every request.
    pub extra_headers: Vec<(String, String)>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            gms_url: DEFAULT_GMS_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            extra_headers: Vec::new(),
        }
    }
}

impl EmitterConfig {
    /// Defaults overridden by `CATALOG_GMS_URL` / `CATALOG_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    /// Unparseable timeouts fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_GMS_URL).filter(|v| !v.is_empty()) {
            config.gms_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).and_then(|v| v.parse().ok()) {
            config.timeout_secs = secs;
        }
        config
    }

    pub fn with_gms_url(mut self, url: impl Into<String>) -> Self {
        self.gms_url = url.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed base URL, always ending in `/` so relative joins keep any
    /// path prefix (`http://host/gms` -> `http://host/gms/`).
    pub fn base_url(&self) -> Result<Url, ArgumentError> {
        let mut url =
            Url::parse(&self.gms_url).map_err(|_| ArgumentError::InvalidUrl(self.gms_url.clone()))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(ArgumentError::InvalidUrl(self.gms_url.clone()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}
