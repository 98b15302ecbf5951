//! Source files for uploads
//!
//! A source is an immutable blob with a display name and a known size. It is
//! only ever read, one chunk at a time.

use crate::error::{Result, UploadError};
use crate::upload::chunks::ChunkSpec;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[derive(Debug, Clone)]
enum Content {
    Memory(Arc<[u8]>),
    File(PathBuf),
}

/// A file selected for upload
#[derive(Debug, Clone)]
pub struct UploadSource {
    name: String,
    size: u64,
    content: Content,
}

impl UploadSource {
    /// Use in-memory bytes as the source
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let data: Vec<u8> = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            content: Content::Memory(Arc::from(data)),
        }
    }

    /// Use a file on disk as the source, named after its last path component
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path does not exist or is not a regular file
    /// - The path has no file name
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;

        if !metadata.is_file() {
            return Err(UploadError::invalid_parameter(
                "path",
                format!("Not a regular file: {}", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                UploadError::invalid_parameter(
                    "path",
                    format!("Path has no file name: {}", path.display()),
                )
            })?;

        Ok(Self {
            name,
            size: metadata.len(),
            content: Content::File(path.to_path_buf()),
        })
    }

    /// Override the display name sent with every chunk
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Path on disk, for file-backed sources
    pub fn path(&self) -> Option<&Path> {
        match &self.content {
            Content::File(path) => Some(path),
            Content::Memory(_) => None,
        }
    }

    /// Read exactly the bytes covered by `chunk`
    pub async fn read_chunk(&self, chunk: &ChunkSpec) -> Result<Vec<u8>> {
        if chunk.end > self.size || chunk.start > chunk.end {
            return Err(UploadError::invalid_parameter(
                "chunk",
                format!(
                    "Range {}..{} is outside a file of {} bytes",
                    chunk.start, chunk.end, self.size
                ),
            ));
        }

        match &self.content {
            Content::Memory(data) => Ok(data[chunk.start as usize..chunk.end as usize].to_vec()),
            Content::File(path) => {
                let mut file = tokio::fs::File::open(path).await?;
                file.seek(std::io::SeekFrom::Start(chunk.start)).await?;
                let mut buffer = vec![0u8; chunk.len() as usize];
                file.read_exact(&mut buffer).await?;
                Ok(buffer)
            }
        }
    }
}
