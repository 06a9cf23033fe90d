use crate::types::{RankingError, Result};
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Runs queued tasks with a fixed ceiling on how many are in flight.
///
/// Tasks are polled cooperatively from the caller's task, so results are gathered
/// at a single point in completion order and need no locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(RankingError::Config("worker pool size must be at least 1".to_string()));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub async fn run<I, F, Fut>(&self, items: I, task: F) -> Vec<Fut::Output>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future,
    {
        stream::iter(items)
            .map(task)
            .buffer_unordered(self.size)
            .collect()
            .await
    }
}
