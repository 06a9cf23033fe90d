use crate::traits::{ByteStream, Fetch};
use crate::types::{FetchConfig, RankingError, Result};
use async_trait::async_trait;
use futures::stream::{StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client })
    }

    fn check_scheme(url: &str) -> Result<Url> {
        let parsed = Url::parse(url)?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(RankingError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[async_trait]
impl Fetch for Fetcher {
    async fn fetch(&self, url: &str) -> Result<ByteStream> {
        let parsed = Self::check_scheme(url)?;
        debug!("Fetching page: {}", url);

        let response = self.client.get(parsed).send().await?;
        let status = response.status();

        // Only a plain 200 counts as a page

        if status != StatusCode::OK {
            return Err(RankingError::Fetch {
                status_code: status.as_u16(),
                status_message: status.canonical_reason().unwrap_or("Unknown").to_string(),
                url: url.to_string(),
            });
        }

        if let Some(length) = response.content_length() {
            debug!("Response for {} announces {} bytes", url, length);
        }

        Ok(response.bytes_stream().map_err(RankingError::from).boxed())
    }
}
