//! Error handling for chunked uploads
//!
//! This module defines the error types used throughout the library.
//! Errors are surfaced to the caller exactly as they occurred: the first
//! failing chunk ends the upload and its error is returned unchanged.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, UploadError>;

/// Error types that can occur while uploading a file in chunks
#[derive(Error, Debug)]
pub enum UploadError {
    /// The selected file has no bytes to send
    #[error("Empty file: {name}")]
    EmptyFile { name: String },

    /// Invalid parameter
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Network or protocol failure while talking to the upload endpoint
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered a chunk with a non-success status
    #[error("Chunk {index} rejected with status {status}: {body}")]
    ServerStatus {
        index: u64,
        status: u16,
        body: String,
    },

    /// The final chunk was accepted but the response carried no asset URI
    #[error("Final chunk response is missing the '{field}' field")]
    MissingAssetUri { field: String },

    /// A content form was submitted without a required asset reference
    #[error("Missing asset reference: {field}")]
    MissingAsset { field: String },

    /// A persisted session does not describe the file being uploaded
    #[error("Upload session mismatch: {message}")]
    SessionMismatch { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UploadError {
    /// Create a new empty file error
    pub fn empty_file(name: impl Into<String>) -> Self {
        UploadError::EmptyFile { name: name.into() }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        UploadError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        UploadError::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new server status error
    pub fn server_status(index: u64, status: u16, body: impl Into<String>) -> Self {
        UploadError::ServerStatus {
            index,
            status,
            body: body.into(),
        }
    }

    /// Create a new missing asset URI error
    pub fn missing_asset_uri(field: impl Into<String>) -> Self {
        UploadError::MissingAssetUri {
            field: field.into(),
        }
    }

    /// Create a new missing asset error
    pub fn missing_asset(field: impl Into<String>) -> Self {
        UploadError::MissingAsset {
            field: field.into(),
        }
    }

    /// Create a new session mismatch error
    pub fn session_mismatch(message: impl Into<String>) -> Self {
        UploadError::SessionMismatch {
            message: message.into(),
        }
    }

    /// Index of the chunk that failed, when the failure came from the endpoint
    pub fn chunk_index(&self) -> Option<u64> {
        match self {
            UploadError::ServerStatus { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = UploadError::empty_file("cover.png");
        assert!(matches!(err, UploadError::EmptyFile { .. }));

        let err = UploadError::invalid_parameter("chunk_size", "must be positive");
        assert!(matches!(err, UploadError::InvalidParameter { .. }));

        let err = UploadError::server_status(3, 500, "boom");
        assert_eq!(err.chunk_index(), Some(3));
    }

    #[test]
    fn test_error_display() {
        let err = UploadError::server_status(1, 502, "bad gateway");
        assert_eq!(
            err.to_string(),
            "Chunk 1 rejected with status 502: bad gateway"
        );

        let err = UploadError::missing_asset_uri("fileUrl");
        assert_eq!(
            err.to_string(),
            "Final chunk response is missing the 'fileUrl' field"
        );

        let err = UploadError::config_error("endpoint is empty");
        assert_eq!(err.to_string(), "Configuration error: endpoint is empty");
        assert_eq!(err.chunk_index(), None);
    }
}
