//! Chunk boundaries for an upload
//!
//! A file of `S` bytes is split into `ceil(S / C)` contiguous chunks of `C`
//! bytes; only the last chunk may be shorter. Chunks are computed on demand
//! and never stored.

use crate::error::{Result, UploadError};
use std::ops::Range;

/// One contiguous byte range of the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    /// Zero-based position of the chunk
    pub index: u64,
    /// Number of chunks in the whole file
    pub total: u64,
    /// First byte of the chunk
    pub start: u64,
    /// One past the last byte of the chunk
    pub end: u64,
}

impl ChunkSpec {
    /// Number of bytes in this chunk
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether this chunk's response carries the asset URI
    pub fn is_final(&self) -> bool {
        self.index + 1 == self.total
    }

    pub fn range(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Chunk layout of a file of known size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    file_size: u64,
    chunk_size: u64,
    total_chunks: u64,
}

impl ChunkPlan {
    /// Compute the layout of a file
    ///
    /// Fails when the chunk size is zero or the file has no bytes; empty
    /// files are rejected before any request is made.
    pub fn new(file_size: u64, chunk_size: u64) -> Result<Self> {
        if chunk_size == 0 {
            return Err(UploadError::invalid_parameter(
                "chunk_size",
                "Chunk size must be greater than 0",
            ));
        }

        if file_size == 0 {
            return Err(UploadError::invalid_parameter(
                "file_size",
                "File size must be greater than 0",
            ));
        }

        Ok(Self {
            file_size,
            chunk_size,
            total_chunks: file_size.div_ceil(chunk_size),
        })
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    /// Boundaries of chunk `index`, or `None` past the end of the file
    pub fn chunk(&self, index: u64) -> Option<ChunkSpec> {
        if index >= self.total_chunks {
            return None;
        }

        let start = index * self.chunk_size;
        let end = self.file_size.min(start + self.chunk_size);

        Some(ChunkSpec {
            index,
            total: self.total_chunks,
            start,
            end,
        })
    }

    /// The final chunk
    pub fn last(&self) -> ChunkSpec {
        // total_chunks >= 1 because file_size > 0
        let index = self.total_chunks - 1;
        let start = index * self.chunk_size;
        ChunkSpec {
            index,
            total: self.total_chunks,
            start,
            end: self.file_size,
        }
    }

    /// All chunks in index order
    pub fn chunks(&self) -> impl Iterator<Item = ChunkSpec> + '_ {
        (0..self.total_chunks).filter_map(move |index| self.chunk(index))
    }
}

/// Progress after `done` of `total` chunks, as `round(done / total * 100)`
///
/// Halves round up, so the result is always in `0..=100` and reaches 100
/// exactly when `done == total`. The arithmetic is exact: a true half such
/// as 23/40 (57.5) gives 58, where floating-point rounding of the same
/// quotient yields 57.
pub fn progress_percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total) as u128;
    let total = total as u128;
    ((done * 200 + total) / (total * 2)) as u8
}
