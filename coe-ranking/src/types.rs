use std::path::PathBuf;

pub use interfaces::{DuplicateHeaders, RankedResult, RankingRow, WorkItem};

pub const DEFAULT_INDEX_URL: &str = "https://allianceforcoffeeexcellence.org/cup-of-excellence/";
pub const DEFAULT_OUTPUT_FILE: &str = "coe_ranking.json";
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 1;
pub const DEFAULT_EXTRACTION_CONCURRENCY: usize = 10;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "COE-Ranking/1.0".to_string(),
            timeout_seconds: 30,
            max_redirects: 5,
        }
    }
}

/// How table cell text is taken from the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellText {
    /// Exactly the cell's text content, whitespace included.
    #[default]
    Raw,
    /// Leading and trailing whitespace removed.
    Trimmed,
}

/// Everything a run needs, handed to each component when it is built.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory under which `.cache/` lives.
    pub base_dir: PathBuf,
    pub output_file: PathBuf,
    /// Programs page listing every country and competition year.
    pub index_url: String,
    pub download_concurrency: usize,
    pub extraction_concurrency: usize,
    pub duplicate_headers: DuplicateHeaders,
    pub cell_text: CellText,
    pub fetch: FetchConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            index_url: DEFAULT_INDEX_URL.to_string(),
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            extraction_concurrency: DEFAULT_EXTRACTION_CONCURRENCY,
            duplicate_headers: DuplicateHeaders::default(),
            cell_text: CellText::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.download_concurrency == 0 {
            return Err(RankingError::Config("download concurrency must be at least 1".to_string()));
        }
        if self.extraction_concurrency == 0 {
            return Err(RankingError::Config("extraction concurrency must be at least 1".to_string()));
        }
        url::Url::parse(&self.index_url)?;
        Ok(())
    }
}

/// A work item that did not make it through a stage.
#[derive(Debug)]
pub struct ItemFailure {
    pub country: String,
    pub year: String,
    pub error: RankingError,
}

impl ItemFailure {
    pub fn new(item: &WorkItem, error: RankingError) -> Self {
        Self {
            country: item.country.clone(),
            year: item.year.clone(),
            error,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status_code}: {status_message} ({url})")]
    Fetch {
        status_code: u16,
        status_message: String,
        url: String,
    },

    #[error("No cached page for {country}/{year}")]
    NotFound { country: String, year: String },

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Invalid cache key component: {0:?}")]
    InvalidKey(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RankingError>;

impl RankingError {
    /// Whether a rerun could plausibly succeed without any change on our side.
    pub fn is_transient(&self) -> bool {
        match self {
            RankingError::Transport(_) => true,
            RankingError::Fetch { status_code, .. } => *status_code >= 500 || *status_code == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RunConfig::default();
        assert_eq!(config.download_concurrency, 1);
        assert_eq!(config.extraction_concurrency, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let config = RunConfig {
            extraction_concurrency: 0,
            ..RunConfig::default()
        };
        assert!(matches!(config.validate(), Err(RankingError::Config(_))));
    }
}
