use crate::traits::Discover;
use crate::types::{Result, WorkItem};
use async_trait::async_trait;

/// A work list known ahead of time.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    items: Vec<WorkItem>,
}

impl StaticSource {
    pub fn new(items: Vec<WorkItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl Discover for StaticSource {
    async fn discover(&self) -> Result<Vec<WorkItem>> {
        Ok(self.items.clone())
    }
}
