//! Client configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::validation::FileValidator;
use crate::validation::file::{DEFAULT_ALLOWED_MIME_TYPES, DEFAULT_MAX_UPLOAD_BYTES};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Configuration for the gateway client and the job poller
///
/// Every field has a default, so a partial config file is enough.
///
/// # Example
///
/// ```rust
/// use data_alchemy_sdk::config::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_base_url("https://alchemy.example.com/api/v1")
///     .with_poll_interval_ms(2000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL, including the version prefix
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Delay between two task status reads
    pub poll_interval_ms: u64,
    /// Rows per page requested from the backend
    pub page_size: u32,
    /// Maximum upload size in bytes
    pub max_upload_bytes: u64,
    /// MIME types accepted for upload
    pub allowed_mime_types: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 10,
            poll_interval_ms: 1000,
            page_size: 20,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl ClientConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the upload size limit
    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Build the file validator for these limits
    pub fn file_validator(&self) -> FileValidator {
        FileValidator::new(self.max_upload_bytes, self.allowed_mime_types.clone())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "base_url must start with http:// or https:// (got '{}')",
                self.base_url
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".to_string());
        }
        if self.page_size == 0 {
            return Err("page_size must be greater than 0".to_string());
        }
        if self.allowed_mime_types.is_empty() {
            return Err("allowed_mime_types must not be empty".to_string());
        }
        Ok(())
    }

    /// Parse a TOML document; missing keys take their defaults
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let config: ClientConfig =
            toml::from_str(content).map_err(|e| format!("Invalid config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    #[cfg(feature = "config-file")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.page_size, 20);
        assert_eq!(config.max_upload_bytes, 100 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ClientConfig::new().with_base_url("ftp://x").validate().is_err());
        assert!(ClientConfig::new().with_poll_interval_ms(0).validate().is_err());
        assert!(ClientConfig::new().with_page_size(0).validate().is_err());
        assert!(ClientConfig::new().with_request_timeout_secs(0).validate().is_err());
    }

    #[test]
    fn test_file_validator_uses_limit() {
        let validator = ClientConfig::new().with_max_upload_bytes(1024).file_validator();
        assert_eq!(validator.max_size(), 1024);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_partial_toml() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "https://alchemy.example.com/api/v1"
            poll_interval_ms = 2500
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://alchemy.example.com/api/v1");
        assert_eq!(config.poll_interval_ms, 2500);
        assert_eq!(config.page_size, 20);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_invalid_toml_value() {
        assert!(ClientConfig::from_toml_str("page_size = 0").is_err());
        assert!(ClientConfig::from_toml_str("page_size = \"many\"").is_err());
    }
}
