use crate::aggregator::Report;
use crate::cache::KeyCache;
use crate::download::Downloader;
use crate::extract::Extractor;
use crate::fetcher::Fetcher;
use crate::parser::TableRenderer;
use crate::pool::WorkerPool;
use crate::sources::IndexPageSource;
use crate::traits::{Discover, Fetch, RenderRanking};
use crate::types::{ItemFailure, Result, RunConfig, WorkItem};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Counts for one run plus every per-item failure from both phases.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub discovered: usize,
    pub cache_hits: usize,
    pub downloaded: usize,
    pub extracted: usize,
    pub failures: Vec<ItemFailure>,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            "{} pages: {} downloaded, {} from cache, {} rankings extracted",
            self.discovered, self.downloaded, self.cache_hits, self.extracted
        );
        for failure in &self.failures {
            let hint = if failure.error.is_transient() {
                "will be retried on the next run"
            } else {
                "needs attention"
            };
            warn!(
                "{} {} failed ({}): {}",
                failure.country, failure.year, hint, failure.error
            );
        }
    }
}

/// Discovery, then the download phase, then the extraction phase, then the report.
///
/// Extraction only starts once every download has been accounted for.
pub struct CoeCollector {
    source: Arc<dyn Discover>,
    downloader: Downloader,
    extractor: Extractor,
}

impl CoeCollector {
    pub fn new(source: Arc<dyn Discover>, downloader: Downloader, extractor: Extractor) -> Self {
        Self {
            source,
            downloader,
            extractor,
        }
    }

    pub fn from_config(config: &RunConfig) -> Result<Self> {
        config.validate()?;

        // Shared by discovery and downloads
        let fetcher: Arc<dyn Fetch> = Arc::new(Fetcher::new(&config.fetch)?);
        let renderer: Arc<dyn RenderRanking> = Arc::new(
            TableRenderer::new(config.duplicate_headers).with_cell_text(config.cell_text),
        );
        let cache = KeyCache::new(&config.base_dir);
        let source = Arc::new(IndexPageSource::new(config.index_url.clone(), fetcher.clone()));

        let downloader = Downloader::new(
            cache.clone(),
            fetcher,
            WorkerPool::new(config.download_concurrency)?,
        );
        let extractor = Extractor::new(
            cache,
            renderer,
            WorkerPool::new(config.extraction_concurrency)?,
        );

        Ok(Self::new(source, downloader, extractor))
    }

    /// Runs every stage. Only discovery failures are fatal here.
    pub async fn collect(&self) -> Result<(Report, RunSummary)> {
        let items = self.source.discover().await?;
        Ok(self.collect_items(&items).await)
    }

    pub async fn collect_items(&self, items: &[WorkItem]) -> (Report, RunSummary) {
        // Downloads must all settle before extraction reads the cache
        let downloads = self.downloader.download_all(items).await;
        let extraction = self.extractor.extract_all(items).await;

        let mut failures = downloads.failures;
        failures.extend(extraction.failures);

        let summary = RunSummary {
            discovered: items.len(),
            cache_hits: downloads.cache_hits,
            downloaded: downloads.downloaded,
            extracted: extraction.results.len(),
            failures,
        };
        (Report::new(extraction.results), summary)
    }

    /// Collects and writes the report to `output`. A write failure fails the run.
    pub async fn run(&self, output: &Path) -> Result<RunSummary> {
        let (report, summary) = self.collect().await?;
        report.write_to_path(output).await?;
        summary.log();
        Ok(summary)
    }
}
