use crate::cache::KeyCache;
use crate::pool::WorkerPool;
use crate::traits::RenderRanking;
use crate::types::{ItemFailure, RankedResult, Result, WorkItem};
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub results: Vec<RankedResult>,
    pub failures: Vec<ItemFailure>,
}

/// Builds rankings from cached pages only; never touches the network.
pub struct Extractor {
    cache: KeyCache,
    renderer: Arc<dyn RenderRanking>,
    pool: WorkerPool,
}

impl Extractor {
    pub fn new(cache: KeyCache, renderer: Arc<dyn RenderRanking>, pool: WorkerPool) -> Self {
        Self {
            cache,
            renderer,
            pool,
        }
    }

    pub fn pool(&self) -> WorkerPool {
        self.pool
    }

    /// Results arrive in completion order; ordering is the aggregator's job.
    pub async fn extract_all(&self, items: &[WorkItem]) -> ExtractionReport {
        info!(
            "Extracting rankings for {} pages (at most {} at a time)",
            items.len(),
            self.pool.size()
        );

        let outcomes = self
            .pool
            .run(items, |item| async move { (item, self.extract(item).await) })
            .await;

        let mut report = ExtractionReport::default();
        for (item, outcome) in outcomes {
            match outcome {
                Ok(result) => report.results.push(result),
                Err(e) => {
                    error!("Extraction failed for {}/{}: {}", item.country, item.year, e);
                    report.failures.push(ItemFailure::new(item, e));
                }
            }
        }
        report
    }

    pub async fn extract(&self, item: &WorkItem) -> Result<RankedResult> {
        info!("Get ranking {} {}", item.country, item.year);
        let html = self.cache.read(&item.country, &item.year).await?;
        let ranking = self.renderer.render(&html).await?;
        debug!("{} {}: {} entrants", item.country, item.year, ranking.len());
        Ok(RankedResult::new(item, ranking))
    }
}
