use anyhow::Context;
use clap::Parser;
use coe_ranking::{CellText, CoeCollector, DuplicateHeaders, RunConfig};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Collects Cup of Excellence rankings into a single JSON file.
#[derive(Debug, Parser)]
#[command(name = "coe-ranking", version)]
struct Args {
    /// Directory holding the `.cache` of downloaded pages
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Where the JSON report is written
    #[arg(long)]
    output: Option<PathBuf>,

    /// Programs page listing every country and year
    #[arg(long)]
    index_url: Option<String>,

    #[arg(long)]
    download_concurrency: Option<usize>,

    #[arg(long)]
    extraction_concurrency: Option<usize>,

    #[arg(long)]
    user_agent: Option<String>,

    #[arg(long)]
    timeout_seconds: Option<u64>,

    /// Keep the first cell when a table repeats a column header
    #[arg(long)]
    keep_first_duplicate_header: bool,

    /// Strip surrounding whitespace from table cells and headers
    #[arg(long)]
    trim_cells: bool,

    /// Overwrite an existing report without asking
    #[arg(short, long)]
    yes: bool,
}

impl Args {
    fn into_config(self) -> RunConfig {
        let mut config = RunConfig::default();
        if let Some(base_dir) = self.base_dir {
            config.base_dir = base_dir;
        }
        if let Some(output) = self.output {
            config.output_file = output;
        }
        if let Some(index_url) = self.index_url {
            config.index_url = index_url;
        }
        if let Some(n) = self.download_concurrency {
            config.download_concurrency = n;
        }
        if let Some(n) = self.extraction_concurrency {
            config.extraction_concurrency = n;
        }
        if let Some(user_agent) = self.user_agent {
            config.fetch.user_agent = user_agent;
        }
        if let Some(timeout) = self.timeout_seconds {
            config.fetch.timeout_seconds = timeout;
        }
        if self.keep_first_duplicate_header {
            config.duplicate_headers = DuplicateHeaders::FirstWins;
        }
        if self.trim_cells {
            config.cell_text = CellText::Trimmed;
        }
        config
    }
}

async fn proceed(output: &Path, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes || !tokio::fs::try_exists(output).await? {
        return Ok(true);
    }

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("{} found, Overwrite it? (y/n)\n", output.display()).as_bytes())
        .await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut answer).await?;
    Ok(answer.trim() == "y")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let yes = args.yes;
    let config = args.into_config();

    // Ask before clobbering an earlier report
    if !proceed(&config.output_file, yes).await? {
        info!("Bye");
        return Ok(());
    }

    info!("Starting COE ranking collection from {}", config.index_url);

    let collector = CoeCollector::from_config(&config).context("Invalid configuration")?;
    let summary = collector
        .run(&config.output_file)
        .await
        .map_err(|e| {
            error!("Run failed: {}", e);
            e
        })
        .with_context(|| format!("Failed to produce {}", config.output_file.display()))?;

    info!(
        "Finished: {} of {} rankings written",
        summary.extracted, summary.discovered
    );
    Ok(())
}
