use crate::traits::RenderRanking;
use crate::types::{CellText, RankingError, RankingRow, Result};
use async_trait::async_trait;
use interfaces::DuplicateHeaders;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub const RANKING_TABLE_SELECTOR: &str = "table.table.table-bordered";

/// Reads the competition results table out of a cached page.
///
/// The first row of the table is the header; every later row becomes one
/// [`RankingRow`] keyed by the lower-cased header text. A row without cells
/// still yields an (empty) ranking row.
#[derive(Debug, Clone, Default)]
pub struct TableRenderer {
    duplicates: DuplicateHeaders,
    cell_text: CellText,
}

impl TableRenderer {
    pub fn new(duplicates: DuplicateHeaders) -> Self {
        Self {
            duplicates,
            cell_text: CellText::default(),
        }
    }

    pub fn with_cell_text(mut self, cell_text: CellText) -> Self {
        self.cell_text = cell_text;
        self
    }

    pub fn parse_ranking(&self, html: &str) -> Result<Vec<RankingRow>> {
        let table_selector = selector(RANKING_TABLE_SELECTOR)?;
        let row_selector = selector("tr")?;
        let cell_selector = selector("td, th")?;

        let document = Html::parse_document(html);
        let table = document.select(&table_selector).next().ok_or_else(|| {
            RankingError::Extraction(format!("no element matches {}", RANKING_TABLE_SELECTOR))
        })?;

        let mut rows = table
            .select(&row_selector)
            .map(|tr| self.cell_texts(tr, &cell_selector));

        // First row names the columns
        let Some(header) = rows.next() else {
            return Ok(Vec::new());
        };

        let ranking: Vec<RankingRow> = rows
            .map(|cells| RankingRow::zip(&header, &cells, self.duplicates))
            .collect();

        debug!("Parsed {} ranking rows over {} columns", ranking.len(), header.len());
        Ok(ranking)
    }

    fn cell_texts(&self, row: ElementRef<'_>, cell_selector: &Selector) -> Vec<String> {
        row.select(cell_selector)
            .map(|cell| {
                // Same as the DOM's textContent: every text node, nothing in between
                let text = cell.text().collect::<String>();
                match self.cell_text {
                    CellText::Raw => text,
                    CellText::Trimmed => text.trim().to_string(),
                }
            })
            .collect()
    }
}

#[async_trait]
impl RenderRanking for TableRenderer {
    async fn render(&self, content: &str) -> Result<Vec<RankingRow>> {
        self.parse_ranking(content)
    }
}

fn selector(source: &str) -> Result<Selector> {
    Selector::parse(source)
        .map_err(|e| RankingError::Extraction(format!("bad selector {}: {}", source, e)))
}
