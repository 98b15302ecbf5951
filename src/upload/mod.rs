//! Chunked uploads
//!
//! This module splits a file into fixed-size chunks, sends them to the
//! upload endpoint with progress tracking, and surfaces the asset URI
//! returned for the final chunk.

pub mod chunks;
pub mod concurrent;
pub mod operations;
pub mod session;
pub mod source;
pub mod types;
pub mod wire;

pub use chunks::{progress_percent, ChunkPlan, ChunkSpec};
pub use operations::{upload_file, Uploader};
pub use session::UploadSession;
pub use source::UploadSource;
pub use types::{ProgressCallback, UploadOptions, UploadProgress, UploadResult, UploadStrategy};
