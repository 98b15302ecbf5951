//! Resumable upload sessions
//!
//! A session records which chunks of one file the endpoint has acknowledged,
//! so that a retry after a failure resumes at the first unacknowledged chunk
//! instead of starting over from chunk 0. Sessions can be persisted as JSON.

use crate::error::{Result, UploadError};
use crate::upload::chunks::{progress_percent, ChunkPlan};
use crate::upload::source::UploadSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSession {
    pub upload_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub chunk_size: u64,
    pub total_chunks: u64,
    acknowledged: Vec<bool>,
    pub asset_uri: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UploadSession {
    /// Start a session for `source` split into `chunk_size` chunks
    pub fn new(source: &UploadSource, chunk_size: u64) -> Result<Self> {
        if source.is_empty() {
            return Err(UploadError::empty_file(source.name()));
        }
        let plan = ChunkPlan::new(source.size(), chunk_size)?;
        let created_at = Utc::now();

        Ok(Self {
            upload_id: fingerprint(source, chunk_size, &created_at),
            file_name: source.name().to_string(),
            file_size: source.size(),
            chunk_size,
            total_chunks: plan.total_chunks(),
            acknowledged: vec![false; plan.total_chunks() as usize],
            asset_uri: None,
            created_at,
        })
    }

    pub fn plan(&self) -> Result<ChunkPlan> {
        ChunkPlan::new(self.file_size, self.chunk_size)
    }

    pub fn is_acknowledged(&self, index: u64) -> bool {
        self.acknowledged
            .get(index as usize)
            .copied()
            .unwrap_or(false)
    }

    pub(crate) fn acknowledge(&mut self, index: u64) {
        if let Some(slot) = self.acknowledged.get_mut(index as usize) {
            *slot = true;
        }
    }

    pub fn acknowledged_count(&self) -> u64 {
        self.acknowledged.iter().filter(|ack| **ack).count() as u64
    }

    /// Bytes covered by acknowledged chunks
    pub fn acknowledged_bytes(&self) -> u64 {
        let Ok(plan) = self.plan() else {
            return 0;
        };
        plan.chunks()
            .filter(|chunk| self.is_acknowledged(chunk.index))
            .map(|chunk| chunk.len())
            .sum()
    }

    /// Index of the first chunk still to be sent
    pub fn first_pending(&self) -> Option<u64> {
        self.acknowledged
            .iter()
            .position(|ack| !*ack)
            .map(|index| index as u64)
    }

    /// Indices of all chunks still to be sent, in order
    pub fn pending(&self) -> Vec<u64> {
        self.acknowledged
            .iter()
            .enumerate()
            .filter(|(_, ack)| !**ack)
            .map(|(index, _)| index as u64)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.first_pending().is_none()
    }

    pub fn percent(&self) -> u8 {
        progress_percent(self.acknowledged_count(), self.total_chunks)
    }

    /// Check that this session describes `source`
    pub fn ensure_matches(&self, source: &UploadSource) -> Result<()> {
        if self.file_name != source.name() {
            return Err(UploadError::session_mismatch(format!(
                "session is for '{}', not '{}'",
                self.file_name,
                source.name()
            )));
        }

        if self.file_size != source.size() {
            return Err(UploadError::session_mismatch(format!(
                "session expects {} bytes, file has {}",
                self.file_size,
                source.size()
            )));
        }

        if self.acknowledged.len() as u64 != self.total_chunks
            || self.plan()?.total_chunks() != self.total_chunks
        {
            return Err(UploadError::session_mismatch(
                "chunk layout does not match the recorded chunk count",
            ));
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(UploadError::from)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(UploadError::from)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn fingerprint(source: &UploadSource, chunk_size: u64, created_at: &DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.name().as_bytes());
    hasher.update(source.size().to_le_bytes());
    hasher.update(chunk_size.to_le_bytes());
    hasher.update(created_at.to_rfc3339().as_bytes());
    let digest = hasher.finalize();
    format!("{:x}", digest)[..32].to_string()
}
