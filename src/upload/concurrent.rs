//! Concurrent chunk dispatch
//!
//! Every chunk but the last is sent through a pool of at most `concurrency`
//! in-flight requests, completing in any order. Once all of them are
//! acknowledged the final chunk is sent alone, so its response is still the
//! one carrying the asset URI.

use crate::error::Result;
use crate::upload::operations::Uploader;
use crate::upload::session::UploadSession;
use crate::upload::source::UploadSource;
use crate::upload::types::{UploadOptions, UploadProgress};
use futures::stream::{self, StreamExt};

impl Uploader {
    pub(crate) async fn run_concurrent(
        &self,
        source: &UploadSource,
        session: &mut UploadSession,
        upload_id: Option<&str>,
        options: &UploadOptions,
    ) -> Result<Option<String>> {
        let plan = session.plan()?;
        let last = plan.last();
        let concurrency = self.config().concurrency.max(1);

        let pending: Vec<_> = session
            .pending()
            .into_iter()
            .filter(|index| *index != last.index)
            .filter_map(|index| plan.chunk(index))
            .collect();

        log::debug!(
            "Dispatching {} chunks of {} with {} in flight",
            pending.len(),
            source.name(),
            concurrency
        );

        let mut in_flight = stream::iter(pending)
            .map(|chunk| async move {
                self.upload_chunk(source, &chunk, upload_id)
                    .await
                    .map(|_| chunk)
            })
            .buffer_unordered(concurrency);

        // Dropping the stream on error abandons the requests still in flight.
        while let Some(result) = in_flight.next().await {
            let chunk = result?;
            session.acknowledge(chunk.index);
            options.report(UploadProgress::new(
                session.acknowledged_bytes(),
                source.size(),
                chunk.index,
                session.acknowledged_count(),
                session.total_chunks,
            ));
        }
        drop(in_flight);

        if session.is_acknowledged(last.index) {
            return Ok(session.asset_uri.clone());
        }

        let body = self.upload_chunk(source, &last, upload_id).await?;
        let uri = self.final_uri(&body);
        if uri.is_none() {
            return Ok(None);
        }
        session.acknowledge(last.index);
        options.report(UploadProgress::new(
            session.acknowledged_bytes(),
            source.size(),
            last.index,
            session.acknowledged_count(),
            session.total_chunks,
        ));

        Ok(uri)
    }
}
