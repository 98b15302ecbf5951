//! Uploader configuration
//!
//! Identity, access key, endpoint and chunk size are passed into the uploader
//! as one explicit value instead of being read from process-wide state.

use crate::error::{Result, UploadError};
use bytesize::ByteSize;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default upload endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/upload-chunk";

/// Default chunk size (2 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 2 * 1024 * 1024;

/// Response field carrying the stored file's URI
pub const DEFAULT_URI_FIELD: &str = "fileUrl";

/// Log level for the command line tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// Configuration for an uploader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// URL that receives every chunk
    #[serde(rename = "endpoint")]
    pub endpoint: String,

    /// Size of every chunk but the last, in bytes (default: 2 MiB)
    #[serde(rename = "chunk-size")]
    pub chunk_size: u64,

    /// Identity of the uploading user, sent as `userId`
    #[serde(rename = "user-id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Shared secret sent as `key`
    #[serde(rename = "access-key", skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Bearer token for the `Authorization` header
    #[serde(rename = "auth-token", skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Field of the final response holding the asset URI (default: "fileUrl")
    #[serde(rename = "uri-field")]
    pub uri_field: String,

    /// Per-request timeout in seconds (default: client default)
    #[serde(rename = "timeout-secs", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Maximum chunks in flight for concurrent uploads (default: 1)
    #[serde(rename = "concurrency")]
    pub concurrency: usize,

    /// Base URL uploaded assets are served from
    #[serde(rename = "asset-base-url", skip_serializing_if = "Option::is_none")]
    pub asset_base_url: Option<String>,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            user_id: None,
            access_key: None,
            auth_token: None,
            uri_field: DEFAULT_URI_FIELD.to_string(),
            timeout_secs: None,
            concurrency: 1,
            asset_base_url: None,
        }
    }
}

impl UploaderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upload endpoint
    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the chunk size in bytes
    pub fn chunk_size(mut self, size: u64) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set the user identity
    pub fn user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the access key
    pub fn access_key<S: Into<String>>(mut self, key: S) -> Self {
        self.access_key = Some(key.into());
        self
    }

    /// Set the bearer token
    pub fn auth_token<S: Into<String>>(mut self, token: S) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the response field holding the asset URI
    pub fn uri_field<S: Into<String>>(mut self, field: S) -> Self {
        self.uri_field = field.into();
        self
    }

    /// Set the per-request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set the number of chunks allowed in flight
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the base URL assets are served from
    pub fn asset_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.asset_base_url = Some(url.into());
        self
    }

    /// Apply `UPLOAD_*` environment variables on top of this configuration
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Create a configuration from defaults and `UPLOAD_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    fn with_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("UPLOAD_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(size) = lookup("UPLOAD_CHUNK_SIZE") {
            self.chunk_size = parse_size(&size)?;
        }
        if let Some(user_id) = lookup("UPLOAD_USER_ID") {
            self.user_id = Some(user_id);
        }
        if let Some(key) = lookup("UPLOAD_ACCESS_KEY") {
            self.access_key = Some(key);
        }
        if let Some(token) = lookup("UPLOAD_AUTH_TOKEN") {
            self.auth_token = Some(token);
        }
        if let Some(field) = lookup("UPLOAD_URI_FIELD") {
            self.uri_field = field;
        }
        if let Some(timeout) = lookup("UPLOAD_TIMEOUT_SECS") {
            self.timeout_secs = Some(timeout.trim().parse().map_err(|_| {
                UploadError::config_error(format!("UPLOAD_TIMEOUT_SECS is not a number: {}", timeout))
            })?);
        }
        if let Some(concurrency) = lookup("UPLOAD_CONCURRENCY") {
            self.concurrency = concurrency.trim().parse().map_err(|_| {
                UploadError::config_error(format!(
                    "UPLOAD_CONCURRENCY is not a number: {}",
                    concurrency
                ))
            })?;
        }
        if let Some(url) = lookup("UPLOAD_ASSET_BASE_URL") {
            self.asset_base_url = Some(url);
        }
        Ok(self)
    }

    /// Check that the configuration can drive an upload
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(UploadError::invalid_parameter(
                "endpoint",
                "Endpoint cannot be empty",
            ));
        }

        if self.chunk_size == 0 {
            return Err(UploadError::invalid_parameter(
                "chunk_size",
                "Chunk size must be greater than 0",
            ));
        }

        if self.uri_field.is_empty() {
            return Err(UploadError::invalid_parameter(
                "uri_field",
                "URI field cannot be empty",
            ));
        }

        if self.concurrency == 0 {
            return Err(UploadError::invalid_parameter(
                "concurrency",
                "Concurrency must be at least 1",
            ));
        }

        if let Some(timeout) = self.timeout_secs {
            if timeout == 0 {
                return Err(UploadError::invalid_parameter(
                    "timeout_secs",
                    "Timeout must be greater than 0",
                ));
            }
        }

        Ok(())
    }

    /// Convert the configuration to a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(UploadError::from)
    }

    /// Create a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(UploadError::from)
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Parse a human readable size such as `2MiB` or `524288`
pub fn parse_size(value: &str) -> Result<u64> {
    let value = value.trim();
    if let Ok(bytes) = value.parse::<u64>() {
        return Ok(bytes);
    }
    value
        .parse::<ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| UploadError::config_error(format!("Invalid size '{}': {}", value, e)))
}
