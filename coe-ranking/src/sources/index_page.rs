use crate::traits::{Discover, Fetch};
use crate::types::{RankingError, Result, WorkItem};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

const PROGRAM_ENTRY_SELECTOR: &str = "ul#menu-coe-country-programs-menu > li";
const SUB_MENU_SELECTOR: &str = ".sub-menu";
const COUNTRY_LINK_SELECTOR: &str = "a";
const YEAR_LINK_SELECTOR: &str = ".sub-menu > li > a";

/// Discovers (country, year) pages from the programs menu of the index page.
pub struct IndexPageSource {
    index_url: String,
    fetcher: Arc<dyn Fetch>,
}

impl IndexPageSource {
    pub fn new(index_url: impl Into<String>, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            index_url: index_url.into(),
            fetcher,
        }
    }
}

#[async_trait]
impl Discover for IndexPageSource {
    async fn discover(&self) -> Result<Vec<WorkItem>> {
        info!("Retrieving program list from {}", self.index_url);
        let html = self.fetcher.fetch_text(&self.index_url).await?;
        let items = parse_index(&html, &self.index_url)?;
        info!("{} program pages found", items.len());
        Ok(items)
    }
}

/// Lists one work item per year link of every country entry that has a sub-menu.
/// Relative links are resolved against `base_url`. Items keep document order.
pub fn parse_index(html: &str, base_url: &str) -> Result<Vec<WorkItem>> {
    let base = Url::parse(base_url)?;
    let entry_selector = selector(PROGRAM_ENTRY_SELECTOR)?;
    let sub_menu_selector = selector(SUB_MENU_SELECTOR)?;
    let country_selector = selector(COUNTRY_LINK_SELECTOR)?;
    let year_selector = selector(YEAR_LINK_SELECTOR)?;

    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for entry in document.select(&entry_selector) {
        if entry.select(&sub_menu_selector).next().is_none() {
            continue;
        }

        let country = entry
            .select(&country_selector)
            .next()
            .map(|a| a.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        if country.is_empty() {
            warn!("Skipping program entry without a country name");
            continue;
        }

        for link in entry.select(&year_selector) {
            let year = link.text().collect::<String>().trim().to_string();
            let Some(href) = link.value().attr("href") else {
                warn!("Skipping {} {}: link has no href", country, year);
                continue;
            };
            if year.is_empty() {
                warn!("Skipping {} link without a year: {}", country, href);
                continue;
            }

            let source_url = base.join(href)?;
            items.push(WorkItem::new(country.clone(), year, source_url.to_string()));
        }
    }

    if items.is_empty() {
        return Err(RankingError::Discovery(format!(
            "no program pages found under {}",
            PROGRAM_ENTRY_SELECTOR
        )));
    }

    Ok(items)
}

fn selector(source: &str) -> Result<Selector> {
    Selector::parse(source)
        .map_err(|e| RankingError::Discovery(format!("bad selector {}: {}", source, e)))
}
