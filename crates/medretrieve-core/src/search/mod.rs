//! Search Services (C5): four independent primitives sharing one contract,
//! safe to invoke concurrently for a single composite search (§4.5).

mod graph;
mod keyword_text;
mod vector_image;
mod vector_text;

pub use graph::GraphSearch;
pub use keyword_text::KeywordTextSearch;
pub use vector_image::{ImageQuery, VectorImageSearch};
pub use vector_text::VectorTextSearch;

use async_trait::async_trait;

use crate::cancellation::Deadline;
use crate::domain::SearchFilter;
use crate::error::Result;

/// One entry of a `RankedList`: 1-indexed rank, preserved across fusion.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem {
    pub id: String,
    pub rank: usize,
    pub score: f32,
}

pub type RankedList = Vec<RankedItem>;

pub(crate) fn rank_from_scored(mut scored: Vec<(String, f32)>) -> RankedList {
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then(a.0.cmp(&b.0)));
    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (id, score))| RankedItem {
            id,
            rank: idx + 1,
            score,
        })
        .collect()
}

#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: &SearchFilter,
        deadline: &Deadline,
    ) -> Result<RankedList>;
}
