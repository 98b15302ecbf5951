use crate::error::{Result, UploadError};
use crate::upload::chunks::progress_percent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How chunks are dispatched to the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadStrategy {
    /// One chunk at a time, in index order
    #[default]
    Sequential,
    /// Up to the configured concurrency in flight, final chunk last
    Concurrent,
    /// Concurrent when it can help, sequential otherwise
    Auto,
}

impl UploadStrategy {
    /// Resolve `Auto` for a file of `total_chunks` and a worker limit
    pub fn resolve(self, concurrency: usize, total_chunks: u64) -> UploadStrategy {
        match self {
            UploadStrategy::Auto if concurrency > 1 && total_chunks > 2 => {
                UploadStrategy::Concurrent
            }
            UploadStrategy::Auto => UploadStrategy::Sequential,
            other => other,
        }
    }
}

impl std::fmt::Display for UploadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStrategy::Sequential => write!(f, "sequential"),
            UploadStrategy::Concurrent => write!(f, "concurrent"),
            UploadStrategy::Auto => write!(f, "auto"),
        }
    }
}

/// Progress reported after every acknowledged chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_uploaded: u64,
    pub total_bytes: u64,
    /// `round(chunks_acknowledged / total_chunks * 100)`
    pub percent: u8,
    /// Index of the chunk that was just acknowledged
    pub chunk_index: u64,
    pub chunks_acknowledged: u64,
    pub total_chunks: u64,
}

impl UploadProgress {
    pub fn new(
        bytes_uploaded: u64,
        total_bytes: u64,
        chunk_index: u64,
        chunks_acknowledged: u64,
        total_chunks: u64,
    ) -> Self {
        Self {
            bytes_uploaded,
            total_bytes,
            percent: progress_percent(chunks_acknowledged, total_chunks),
            chunk_index,
            chunks_acknowledged,
            total_chunks,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.chunks_acknowledged == self.total_chunks
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[derive(Clone, Default)]
pub struct UploadOptions {
    pub strategy: UploadStrategy,
    pub on_progress: Option<ProgressCallback>,
    /// Name sent instead of the source's own name
    pub file_name: Option<String>,
}

impl std::fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOptions")
            .field("strategy", &self.strategy)
            .field("on_progress", &self.on_progress.is_some())
            .field("file_name", &self.file_name)
            .finish()
    }
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: UploadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.file_name {
            if name.trim().is_empty() {
                return Err(UploadError::invalid_parameter(
                    "file_name",
                    "File name cannot be empty",
                ));
            }
        }

        Ok(())
    }

    pub(crate) fn report(&self, progress: UploadProgress) {
        if let Some(ref callback) = self.on_progress {
            callback(progress);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// URI taken unmodified from the final chunk's response
    pub asset_uri: Option<String>,
    pub file_name: String,
    pub size: u64,
    pub chunks: u64,
    pub duration_ms: u64,
    /// Identifier of the resumable session, if one was used
    pub upload_id: Option<String>,
}

impl UploadResult {
    pub fn new(file_name: impl Into<String>, size: u64, chunks: u64) -> Self {
        Self {
            asset_uri: None,
            file_name: file_name.into(),
            size,
            chunks,
            duration_ms: 0,
            upload_id: None,
        }
    }

    pub fn asset_uri(mut self, uri: Option<String>) -> Self {
        self.asset_uri = uri;
        self
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn upload_id(mut self, upload_id: impl Into<String>) -> Self {
        self.upload_id = Some(upload_id.into());
        self
    }

    /// The asset URI, or an error when the endpoint omitted it
    ///
    /// Forms that store the reference must refuse to proceed on this error.
    pub fn require_asset_uri(&self, field: &str) -> Result<&str> {
        self.asset_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| UploadError::missing_asset_uri(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_upload_progress() {
        let progress = UploadProgress::new(2048, 5120, 1, 2, 3);
        assert_eq!(progress.percent, 67);
        assert!(!progress.is_complete());

        let done = UploadProgress::new(5120, 5120, 2, 3, 3);
        assert_eq!(done.percent, 100);
        assert!(done.is_complete());
    }

    #[test]
    fn test_upload_options() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let options = UploadOptions::new()
            .strategy(UploadStrategy::Concurrent)
            .file_name("cover.png")
            .on_progress(move |p| sink.lock().unwrap().push(p.percent));

        assert_eq!(options.strategy, UploadStrategy::Concurrent);
        assert_eq!(options.file_name.as_deref(), Some("cover.png"));
        options.report(UploadProgress::new(1, 2, 0, 1, 2));
        assert_eq!(*seen.lock().unwrap(), vec![50]);

        assert!(UploadOptions::new().file_name(" ").validate().is_err());
        assert!(format!("{:?}", options).contains("on_progress: true"));
    }

    #[test]
    fn test_strategy_resolution() {
        assert_eq!(
            UploadStrategy::Auto.resolve(4, 10),
            UploadStrategy::Concurrent
        );
        assert_eq!(UploadStrategy::Auto.resolve(1, 10), UploadStrategy::Sequential);
        assert_eq!(UploadStrategy::Auto.resolve(4, 2), UploadStrategy::Sequential);
        assert_eq!(
            UploadStrategy::Concurrent.resolve(1, 1),
            UploadStrategy::Concurrent
        );
    }

    #[test]
    fn test_upload_result() {
        let result = UploadResult::new("book.pdf", 1024, 1)
            .asset_uri(Some("uploads/book.pdf".to_string()))
            .duration_ms(12);
        assert_eq!(result.require_asset_uri("fileUrl").unwrap(), "uploads/book.pdf");

        let missing = UploadResult::new("book.pdf", 1024, 1);
        assert!(matches!(
            missing.require_asset_uri("fileUrl"),
            Err(UploadError::MissingAssetUri { .. })
        ));
    }
}
