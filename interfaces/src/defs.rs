use serde::ser::{Serialize, SerializeMap, Serializer};

/// One document to collect, identified by its (country, year) key pair.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct WorkItem {
    pub country: String,
    pub year: String,
    #[serde(rename = "href")]
    pub source_url: String,
}

impl WorkItem {
    pub fn new(country: impl Into<String>, year: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            year: year.into(),
            source_url: source_url.into(),
        }
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.country, &self.year)
    }
}

/// What to do when a header row names the same column twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicateHeaders {
    /// The later cell replaces the earlier one, keeping the first position.
    #[default]
    LastWins,
    /// The first cell is kept and later ones are ignored.
    FirstWins,
}

/// A single ranked entrant: lower-cased column header to cell text, in header order.
///
/// Serializes as a JSON object whose keys follow header order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RankingRow {
    cells: Vec<(String, String)>,
}

impl RankingRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs each header with the cell at the same index. Cells past the end of the
    /// header are dropped, headers past the end of the cells are left out of the row.
    pub fn zip<H, C>(headers: &[H], cells: &[C], duplicates: DuplicateHeaders) -> Self
    where
        H: AsRef<str>,
        C: AsRef<str>,
    {
        let mut row = Self::new();
        for (header, cell) in headers.iter().zip(cells.iter()) {
            row.insert(header.as_ref(), cell.as_ref(), duplicates);
        }
        row
    }

    pub fn insert(&mut self, header: &str, value: &str, duplicates: DuplicateHeaders) {
        let key = header.to_lowercase();
        match self.cells.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, current)) => {
                if duplicates == DuplicateHeaders::LastWins {
                    *current = value.to_string();
                }
            }
            None => self.cells.push((key, value.to_string())),
        }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        let key = header.to_lowercase();
        self.cells
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(header, _)| header.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<H, V> FromIterator<(H, V)> for RankingRow
where
    H: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (header, value) in iter {
            row.insert(header.as_ref(), value.as_ref(), DuplicateHeaders::default());
        }
        row
    }
}

impl Serialize for RankingRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (header, value) in &self.cells {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

/// The ranking table extracted for one work item.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RankedResult {
    pub country: String,
    pub year: String,
    #[serde(rename = "href")]
    pub source_url: String,
    pub ranking: Vec<RankingRow>,
}

impl RankedResult {
    pub fn new(item: &WorkItem, ranking: Vec<RankingRow>) -> Self {
        Self {
            country: item.country.clone(),
            year: item.year.clone(),
            source_url: item.source_url.clone(),
            ranking,
        }
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.country, &self.year)
    }
}

// Object style note:
// These are plain values handed between pipeline stages. They never touch the
// network or the disk; the collector crate owns every side effect.
