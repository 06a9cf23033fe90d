#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use coe_ranking::{ByteStream, Fetch, RankingError, RankingRow, RenderRanking, Result, TableRenderer, WorkItem};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Tracks how many operations are running and the most that ever ran together.
#[derive(Debug, Default)]
pub struct InFlight {
    calls: AtomicUsize,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    pub fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(self.clone())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub enum Page {
    Body(String),
    Status(u16, &'static str),
    /// Sends the given prefix, then breaks the connection.
    Truncated(String),
}

/// In-memory site. A call counts as in flight until its body stream is dropped.
pub struct MockFetcher {
    pages: HashMap<String, Page>,
    pub in_flight: Arc<InFlight>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub fn with_page(mut self, url: &str, page: Page) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<ByteStream> {
        let guard = self.in_flight.enter();
        tokio::time::sleep(Duration::from_millis(2)).await;

        let (body, broken) = match self.pages.get(url) {
            Some(Page::Body(body)) => (body.clone(), false),
            Some(Page::Truncated(prefix)) => (prefix.clone(), true),
            Some(Page::Status(code, message)) => {
                return Err(RankingError::Fetch {
                    status_code: *code,
                    status_message: message.to_string(),
                    url: url.to_string(),
                })
            }
            None => {
                return Err(RankingError::Fetch {
                    status_code: 404,
                    status_message: "Not Found".to_string(),
                    url: url.to_string(),
                })
            }
        };

        let mut chunks: Vec<Result<Bytes>> = body
            .as_bytes()
            .chunks(16)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        if broken {
            chunks.push(Err(RankingError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))));
        }

        let stream = stream::iter(chunks).then(move |chunk| {
            let _held = &guard;
            async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                chunk
            }
        });
        Ok(stream.boxed())
    }
}

/// Table renderer that records overlapping calls.
pub struct CountingRenderer {
    inner: TableRenderer,
    delay: Duration,
    pub in_flight: Arc<InFlight>,
}

impl CountingRenderer {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: TableRenderer::default(),
            delay,
            in_flight: Arc::new(InFlight::default()),
        }
    }
}

#[async_trait]
impl RenderRanking for CountingRenderer {
    async fn render(&self, content: &str) -> Result<Vec<RankingRow>> {
        let _guard = self.in_flight.enter();
        tokio::time::sleep(self.delay).await;
        self.inner.parse_ranking(content)
    }
}

pub fn results_page(farm: &str, score: &str) -> String {
    format!(
        r#"<html><body>
        <table class="table table-bordered">
          <tr><th>Rank</th><th>Farm</th><th>Score</th></tr>
          <tr><td>1</td><td>{}</td><td>{}</td></tr>
        </table>
        </body></html>"#,
        farm, score
    )
}

pub fn url_for(country: &str, year: &str) -> String {
    format!("https://coe.example/{}-{}/", country.to_lowercase(), year)
}

pub fn item(country: &str, year: &str) -> WorkItem {
    WorkItem::new(country, year, url_for(country, year))
}
