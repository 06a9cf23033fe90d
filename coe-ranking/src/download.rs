use crate::cache::KeyCache;
use crate::pool::WorkerPool;
use crate::traits::Fetch;
use crate::types::{ItemFailure, Result, WorkItem};
use futures::stream::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    CacheHit,
    Downloaded { bytes: u64 },
}

#[derive(Debug, Default)]
pub struct DownloadReport {
    pub cache_hits: usize,
    pub downloaded: usize,
    pub bytes: u64,
    pub failures: Vec<ItemFailure>,
}

/// Fills the cache for every work item that is not there yet.
///
/// The pool size is the politeness policy towards the remote site: with the
/// default of one, at most one request is ever in flight.
pub struct Downloader {
    cache: KeyCache,
    fetcher: Arc<dyn Fetch>,
    pool: WorkerPool,
}

impl Downloader {
    pub fn new(cache: KeyCache, fetcher: Arc<dyn Fetch>, pool: WorkerPool) -> Self {
        Self {
            cache,
            fetcher,
            pool,
        }
    }

    pub fn pool(&self) -> WorkerPool {
        self.pool
    }

    /// Processes the whole list. A failing item is logged and recorded; it never
    /// stops the others.
    pub async fn download_all(&self, items: &[WorkItem]) -> DownloadReport {
        info!(
            "Downloading {} pages (at most {} at a time)",
            items.len(),
            self.pool.size()
        );

        let outcomes = self
            .pool
            .run(items, |item| async move {
                let outcome = self.download_if_needed(item).await;
                (item, outcome)
            })
            .await;

        // Tally outcomes
        let mut report = DownloadReport::default();
        for (item, outcome) in outcomes {
            match outcome {
                Ok(DownloadOutcome::CacheHit) => report.cache_hits += 1,
                Ok(DownloadOutcome::Downloaded { bytes }) => {
                    report.downloaded += 1;
                    report.bytes += bytes;
                }
                Err(e) => {
                    error!("Download failed for {}/{}: {}", item.country, item.year, e);
                    report.failures.push(ItemFailure::new(item, e));
                }
            }
        }

        info!(
            "Download phase done: {} downloaded, {} cached, {} failed",
            report.downloaded,
            report.cache_hits,
            report.failures.len()
        );
        report
    }

    pub async fn download_if_needed(&self, item: &WorkItem) -> Result<DownloadOutcome> {
        // Check cache first
        if self.cache.exists(&item.country, &item.year).await? {
            info!("Cache found for {} {}", item.country, item.year);
            return Ok(DownloadOutcome::CacheHit);
        }

        info!(
            "Cache not found, downloading {} {} from {}",
            item.country, item.year, item.source_url
        );

        let mut body = self.fetcher.fetch(&item.source_url).await?;
        // Nothing is visible in the cache until the sink is finished
        let mut sink = self
            .cache
            .acquire_write_sink(&item.country, &item.year)
            .await?;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            debug!("{} {}: received {} bytes", item.country, item.year, chunk.len());
            sink.write(&chunk).await?;
        }

        let bytes = sink.finish().await?;
        Ok(DownloadOutcome::Downloaded { bytes })
    }
}
