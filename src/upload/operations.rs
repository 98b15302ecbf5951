//! Upload operations implementation

use crate::config::UploaderConfig;
use crate::error::{Result, UploadError};
use crate::upload::chunks::{ChunkPlan, ChunkSpec};
use crate::upload::session::UploadSession;
use crate::upload::source::UploadSource;
use crate::upload::types::{UploadOptions, UploadProgress, UploadResult, UploadStrategy};
use crate::upload::wire::{chunk_form, extract_asset_uri};
use std::path::Path;
use std::time::{Duration, Instant};

/// Sends files to a chunk endpoint
///
/// The uploader owns its configuration and HTTP client. Independent uploads
/// may run on the same uploader at the same time; they share no state.
#[derive(Debug, Clone)]
pub struct Uploader {
    config: UploaderConfig,
    client: reqwest::Client,
}

impl Uploader {
    /// Create an uploader from a validated configuration
    pub fn new(config: UploaderConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    /// Create an uploader around an existing client
    pub fn with_client(config: UploaderConfig, client: reqwest::Client) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Upload `source` and return the asset URI from the final chunk
    ///
    /// Chunks go out one at a time in index order unless the options ask for
    /// a concurrent strategy. The first failing chunk ends the upload: no
    /// later chunk is sent and the error is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is empty (before any request is made)
    /// - Any chunk fails to be read or is rejected by the endpoint
    pub async fn upload(
        &self,
        source: &UploadSource,
        options: UploadOptions,
    ) -> Result<UploadResult> {
        let source = prepare_source(source, &options)?;
        let plan = ChunkPlan::new(source.size(), self.config.chunk_size)?;
        let start_time = Instant::now();

        let strategy = options
            .strategy
            .resolve(self.config.concurrency, plan.total_chunks());
        log::info!(
            "Uploading {} ({} bytes) in {} chunks, {}",
            source.name(),
            source.size(),
            plan.total_chunks(),
            strategy
        );

        let asset_uri = match strategy {
            UploadStrategy::Concurrent => {
                let mut session = UploadSession::new(&source, self.config.chunk_size)?;
                self.run_concurrent(&source, &mut session, None, &options)
                    .await?
            }
            _ => self.run_sequential(&source, &plan, &options).await?,
        };

        Ok(UploadResult::new(source.name(), source.size(), plan.total_chunks())
            .asset_uri(asset_uri)
            .duration_ms(start_time.elapsed().as_millis() as u64))
    }

    /// Upload the chunks of `source` that `session` has not yet acknowledged
    ///
    /// Acknowledgements are recorded in `session` as they arrive, so after a
    /// failure the same session can be passed in again to resume from the
    /// first unacknowledged chunk. A completed session returns its stored URI
    /// without contacting the endpoint. A final chunk whose response lacks
    /// the URI is left unacknowledged, so the next attempt sends it again.
    pub async fn upload_with_session(
        &self,
        source: &UploadSource,
        session: &mut UploadSession,
        options: UploadOptions,
    ) -> Result<UploadResult> {
        let source = prepare_source(source, &options)?;
        session.ensure_matches(&source)?;
        let start_time = Instant::now();

        let asset_uri = if session.is_complete() {
            log::debug!(
                "Session {} already complete, reusing stored URI",
                session.upload_id
            );
            session.asset_uri.clone()
        } else {
            let strategy = options
                .strategy
                .resolve(self.config.concurrency, session.pending().len() as u64);
            log::info!(
                "Resuming {} at chunk {:?} of {} ({})",
                source.name(),
                session.first_pending(),
                session.total_chunks,
                strategy
            );
            let upload_id = session.upload_id.clone();

            let uri = match strategy {
                UploadStrategy::Concurrent => {
                    self.run_concurrent(&source, session, Some(&upload_id), &options)
                        .await?
                }
                _ => {
                    self.run_session_sequential(&source, session, &upload_id, &options)
                        .await?
                }
            };
            session.asset_uri = uri.clone();
            uri
        };

        Ok(
            UploadResult::new(source.name(), source.size(), session.total_chunks)
                .asset_uri(asset_uri)
                .upload_id(session.upload_id.clone())
                .duration_ms(start_time.elapsed().as_millis() as u64),
        )
    }

    /// Send a single chunk and return the endpoint's response body
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk cannot be read, the request fails, or
    /// the endpoint answers with a non-success status.
    pub async fn upload_chunk(
        &self,
        source: &UploadSource,
        chunk: &ChunkSpec,
        upload_id: Option<&str>,
    ) -> Result<Vec<u8>> {
        let payload = source.read_chunk(chunk).await?;
        let form = chunk_form(&self.config, chunk, source.name(), payload, upload_id)?;

        let mut request = self.client.post(&self.config.endpoint).multipart(form);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        log::trace!(
            "Sending chunk {}/{} of {} ({} bytes)",
            chunk.index + 1,
            chunk.total,
            source.name(),
            chunk.len()
        );

        let response = request.send().await.map_err(|e| {
            log::error!("Error uploading chunk {}: {}", chunk.index, e);
            e
        })?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            log::error!(
                "Chunk {} of {} rejected with status {}",
                chunk.index,
                source.name(),
                status
            );
            return Err(UploadError::server_status(
                chunk.index,
                status.as_u16(),
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }

        Ok(body.to_vec())
    }

    async fn run_sequential(
        &self,
        source: &UploadSource,
        plan: &ChunkPlan,
        options: &UploadOptions,
    ) -> Result<Option<String>> {
        let mut bytes_uploaded = 0;
        let mut asset_uri = None;

        for chunk in plan.chunks() {
            let body = self.upload_chunk(source, &chunk, None).await?;
            bytes_uploaded += chunk.len();

            options.report(UploadProgress::new(
                bytes_uploaded,
                source.size(),
                chunk.index,
                chunk.index + 1,
                chunk.total,
            ));

            if chunk.is_final() {
                asset_uri = self.final_uri(&body);
            }
        }

        Ok(asset_uri)
    }

    async fn run_session_sequential(
        &self,
        source: &UploadSource,
        session: &mut UploadSession,
        upload_id: &str,
        options: &UploadOptions,
    ) -> Result<Option<String>> {
        let plan = session.plan()?;
        let mut asset_uri = session.asset_uri.clone();

        for index in session.pending() {
            let Some(chunk) = plan.chunk(index) else {
                continue;
            };
            let body = self.upload_chunk(source, &chunk, Some(upload_id)).await?;
            if chunk.is_final() {
                asset_uri = self.final_uri(&body);
                // Without a URI the final chunk stays pending so a retry can fetch it
                if asset_uri.is_none() {
                    break;
                }
            }
            session.acknowledge(index);

            options.report(UploadProgress::new(
                session.acknowledged_bytes(),
                source.size(),
                index,
                session.acknowledged_count(),
                session.total_chunks,
            ));
        }

        Ok(asset_uri)
    }

    pub(crate) fn final_uri(&self, body: &[u8]) -> Option<String> {
        let uri = extract_asset_uri(body, &self.config.uri_field);
        match &uri {
            Some(uri) => log::info!("Upload complete: {}", uri),
            None => log::warn!(
                "Final chunk accepted but response has no '{}' field",
                self.config.uri_field
            ),
        }
        uri
    }
}

fn prepare_source(source: &UploadSource, options: &UploadOptions) -> Result<UploadSource> {
    options.validate()?;

    if source.is_empty() {
        return Err(UploadError::empty_file(source.name()));
    }

    Ok(match &options.file_name {
        Some(name) => source.clone().with_name(name.clone()),
        None => source.clone(),
    })
}

/// Upload a file from disk with the given configuration
///
/// Convenience wrapper that builds an [`Uploader`] and a file-backed
/// [`UploadSource`].
pub async fn upload_file<P: AsRef<Path>>(
    config: UploaderConfig,
    path: P,
    options: UploadOptions,
) -> Result<UploadResult> {
    let uploader = Uploader::new(config)?;
    let source = UploadSource::from_path(path).await?;
    uploader.upload(&source, options).await
}
