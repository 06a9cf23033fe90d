pub mod types;
pub mod traits;
pub mod cache;
pub mod fetcher;
pub mod pool;
pub mod download;
pub mod parser;
pub mod extract;
pub mod aggregator;
pub mod sources;
pub mod pipeline;

pub use types::*;
pub use traits::{ByteStream, Discover, Fetch, RenderRanking};
pub use cache::{CacheSink, KeyCache};
pub use fetcher::Fetcher;
pub use pool::WorkerPool;
pub use download::{DownloadOutcome, DownloadReport, Downloader};
pub use parser::TableRenderer;
pub use extract::{ExtractionReport, Extractor};
pub use aggregator::Report;
pub use sources::{IndexPageSource, StaticSource};
pub use pipeline::{CoeCollector, RunSummary};
