use std::sync::Arc;

use async_trait::async_trait;

use crate::cancellation::Deadline;
use crate::domain::SearchFilter;
use crate::error::Result;
use crate::store::Store;

use super::{RankedItem, RankedList, SearchService};

/// Resolves query tokens to entities by case-insensitive substring match,
/// then ranks documents mentioning those entities by
/// `(entity_match_count desc, sum(confidence) desc, document_id asc)` (§4.5).
pub struct GraphSearch {
    store: Arc<dyn Store>,
}

impl GraphSearch {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SearchService for GraphSearch {
    async fn search(
        &self,
        query: &str,
        k: usize,
        _filter: &SearchFilter,
        deadline: &Deadline,
    ) -> Result<RankedList> {
        let tokens: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let entities = deadline
            .race(self.store.entities_by_text(&tokens, 100))
            .await?;
        let entity_ids: Vec<i64> = entities.iter().map(|e| e.entity_id).collect();
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }

        let matches = deadline
            .race(self.store.documents_mentioning_entities(&entity_ids, k))
            .await?;

        Ok(matches
            .into_iter()
            .enumerate()
            .map(|(idx, m)| RankedItem {
                id: m.document_id,
                rank: idx + 1,
                score: m.confidence_sum,
            })
            .collect())
    }
}
