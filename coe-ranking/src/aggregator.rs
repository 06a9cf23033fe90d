use crate::types::{RankedResult, Result};
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::info;

/// Ranking results ordered by (country, year).
#[derive(Debug, Clone, Default)]
pub struct Report {
    results: Vec<RankedResult>,
}

impl Report {
    pub fn new(mut results: Vec<RankedResult>) -> Self {
        results.sort_by(|a, b| a.key().cmp(&b.key()));
        Self { results }
    }

    pub fn results(&self) -> &[RankedResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Streams the report as a JSON array, one compact object per line.
    pub async fn write_json<W>(&self, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(b"[\n").await?;
        for (i, result) in self.results.iter().enumerate() {
            if i != 0 {
                writer.write_all(b",\n").await?;
            }
            let encoded = serde_json::to_vec(result)?;
            writer.write_all(&encoded).await?;
        }
        writer.write_all(b"\n]").await?;
        writer.flush().await?;
        Ok(())
    }

    pub async fn write_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        // Truncates any previous report
        info!("Write to {}", path.display());
        let mut writer = BufWriter::new(File::create(path).await?);
        self.write_json(&mut writer).await?;
        writer.get_ref().sync_all().await?;
        Ok(())
    }
}
