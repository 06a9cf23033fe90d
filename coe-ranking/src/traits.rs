use crate::types::{RankingRow, Result, WorkItem};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};

/// Ordered body chunks of a successful response. Must be drained to the end.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Single-attempt retrieval of a document by URL.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Resolves once the remote has answered with the success status.
    /// Any other status is a `RankingError::Fetch`.
    async fn fetch(&self, url: &str) -> Result<ByteStream>;

    /// Drains [`fetch`](Self::fetch) into a string, replacing invalid UTF-8.
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let mut stream = self.fetch(url).await?;
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8(body)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}

/// Produces the list of documents to collect, once per run.
#[async_trait]
pub trait Discover: Send + Sync {
    async fn discover(&self) -> Result<Vec<WorkItem>>;
}

/// Turns cached page content into ranking rows.
#[async_trait]
pub trait RenderRanking: Send + Sync {
    /// Fails with `RankingError::Extraction` when the ranking table is missing.
    async fn render(&self, content: &str) -> Result<Vec<RankingRow>>;
}
