//! Request and response layout of the chunk endpoint
//!
//! Every chunk is a multipart form with the binary payload and its position
//! in the file. Only the response to the final chunk is read: it must be a
//! JSON object holding the stored file's URI.

use crate::config::UploaderConfig;
use crate::error::Result;
use crate::upload::chunks::ChunkSpec;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

pub const FIELD_CHUNK: &str = "chunk";
pub const FIELD_CHUNK_INDEX: &str = "chunkIndex";
pub const FIELD_TOTAL_CHUNKS: &str = "totalChunks";
pub const FIELD_FILE_NAME: &str = "fileName";
pub const FIELD_USER_ID: &str = "userId";
pub const FIELD_KEY: &str = "key";
pub const FIELD_UPLOAD_ID: &str = "uploadId";

/// Build the multipart form for one chunk
///
/// `upload_id` is only set for resumable sessions so the endpoint can accept
/// a chunk index it has already seen.
pub fn chunk_form(
    config: &UploaderConfig,
    chunk: &ChunkSpec,
    file_name: &str,
    payload: Vec<u8>,
    upload_id: Option<&str>,
) -> Result<Form> {
    let part = Part::bytes(payload)
        .file_name(file_name.to_string())
        .mime_str("application/octet-stream")?;

    let mut form = Form::new()
        .part(FIELD_CHUNK, part)
        .text(FIELD_CHUNK_INDEX, chunk.index.to_string())
        .text(FIELD_TOTAL_CHUNKS, chunk.total.to_string())
        .text(FIELD_FILE_NAME, file_name.to_string());

    if let Some(user_id) = &config.user_id {
        form = form.text(FIELD_USER_ID, user_id.clone());
    }
    if let Some(key) = &config.access_key {
        form = form.text(FIELD_KEY, key.clone());
    }
    if let Some(upload_id) = upload_id {
        form = form.text(FIELD_UPLOAD_ID, upload_id.to_string());
    }

    Ok(form)
}

/// Pull the asset URI out of the final chunk's response body
///
/// `field` may be a dotted path such as `data.fileUrl`. Returns `None` when
/// the body is not JSON or the field is absent, empty, or not a string.
pub fn extract_asset_uri(body: &[u8], field: &str) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let mut current = &value;
    for segment in field.split('.') {
        current = current.get(segment)?;
    }
    current
        .as_str()
        .filter(|uri| !uri.is_empty())
        .map(str::to_string)
}
