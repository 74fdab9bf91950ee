use std::sync::Arc;

use async_trait::async_trait;

use crate::cancellation::Deadline;
use crate::domain::SearchFilter;
use crate::error::Result;
use crate::store::Store;

use super::{RankedItem, RankedList, SearchService};

/// Lowercase-tokenizes the query and matches against **decoded** document
/// text only — never the raw hex-encoded source (§4.5, §8 regression guard).
pub struct KeywordTextSearch {
    store: Arc<dyn Store>,
}

impl KeywordTextSearch {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

fn tokenize(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[async_trait]
impl SearchService for KeywordTextSearch {
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: &SearchFilter,
        deadline: &Deadline,
    ) -> Result<RankedList> {
        let terms = tokenize(query);
        let mut scored = deadline
            .race(self.store.keyword_top_k(&terms, k, filter))
            .await?;
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(idx, (id, overlap))| RankedItem {
                id,
                rank: idx + 1,
                score: overlap as f32,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeStore;
    use chrono::Utc;

    #[tokio::test]
    async fn matches_decoded_text_only() {
        let store = Arc::new(FakeStore::new());
        store.seed_document("doc-1", "patient reports chest pain today", Utc::now()).await;
        let service = KeywordTextSearch::new(store);
        let results = service
            .search("chest pain", 10, &SearchFilter::default(), &Deadline::none())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "doc-1");
    }

    #[tokio::test]
    async fn no_match_yields_empty_list() {
        let store = Arc::new(FakeStore::new());
        store.seed_document("doc-1", "unrelated content", Utc::now()).await;
        let service = KeywordTextSearch::new(store);
        let results = service
            .search("chest pain", 10, &SearchFilter::default(), &Deadline::none())
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
