pub mod asset;
pub mod config;
pub mod error;
pub mod upload;

pub use asset::{AssetForm, AssetRef, AssetSlot, ContentKind};

pub use config::{parse_size, LogLevel, UploaderConfig};

pub use error::{Result, UploadError};

pub use upload::{
    progress_percent, upload_file, ChunkPlan, ChunkSpec, ProgressCallback, UploadOptions,
    UploadProgress, UploadResult, UploadSession, UploadSource, UploadStrategy, Uploader,
};
