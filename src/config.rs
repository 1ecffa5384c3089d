//! Configuration Management
//!
//! Handles persistent configuration for the function. Values come from
//! built-in defaults, then an optional JSON/YAML file, then CLI flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Page listing Cloudflare's IPv4 ranges in plain text
pub const DEFAULT_RANGES_URL: &str = "https://www.cloudflare.com/ips-v4";

/// Function configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Endpoint returning the address ranges to allow
    pub ranges_url: String,
    /// Upper bound for a single fetch attempt
    pub request_timeout_secs: u64,
    /// Upper bound for establishing the connection
    pub connect_timeout_secs: u64,
    /// Extra attempts after a transient fetch failure
    pub max_retries: u32,
    /// Backoff step between attempts, multiplied by the attempt number
    pub retry_backoff_ms: u64,
    /// TTL reported back to the pipeline host
    pub response_ttl_secs: u64,
    /// Address the HTTP transport binds to
    pub listen_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ranges_url: DEFAULT_RANGES_URL.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 2,
            retry_backoff_ms: 500,
            response_ttl_secs: 60,
            listen_addr: "0.0.0.0:9443".to_string(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("function-cloudflare-nsg").join("config.json"))
    }

    /// Load configuration from an explicit path, or from the default location.
    ///
    /// An explicit path that cannot be read is an error. A missing file at the
    /// default location falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse a config file; `.yaml`/`.yml` are read as YAML, everything else as JSON
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        let config = if is_yaml {
            serde_yaml::from_str(&content)
                .with_context(|| format!("cannot parse YAML config {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("cannot parse JSON config {}", path.display()))?
        };

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check that the values are usable
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.ranges_url)
            .with_context(|| format!("invalid ranges_url {:?}", self.ranges_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("ranges_url must be http or https, got {}", url.scheme());
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// TTL in the pipeline's duration notation, e.g. `60s`
    pub fn response_ttl(&self) -> String {
        format!("{}s", self.response_ttl_secs)
    }
}
