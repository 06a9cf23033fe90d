pub mod defs;

pub use defs::{DuplicateHeaders, RankedResult, RankingRow, WorkItem};
