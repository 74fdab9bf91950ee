//! Memory Store (C7): semantic memory business logic over the `Store`
//! capability trait — remember / recall / stats / delete (§4.7).

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::cancellation::Deadline;
use crate::domain::{Memory, MemoryKind};
use crate::embeddings::EmbeddingClient;
use crate::error::Result;
use crate::store::{MemoryStats, Store};

pub struct MemoryService {
    store: Arc<dyn Store>,
    embedding_client: Arc<dyn EmbeddingClient>,
    default_min_similarity: f32,
}

impl MemoryService {
    pub fn new(
        store: Arc<dyn Store>,
        embedding_client: Arc<dyn EmbeddingClient>,
        default_min_similarity: f32,
    ) -> Self {
        Self {
            store,
            embedding_client,
            default_min_similarity,
        }
    }

    /// Content hash of `(kind, text)`, hex-encoded (§3 Memory identity).
    pub fn content_hash(kind: MemoryKind, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update(b"\0");
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Insert a new memory, or reinforce (increment `use_count`, refresh
    /// `updated_at`) an existing one with the same content hash.
    pub async fn remember(
        &self,
        kind: MemoryKind,
        text: &str,
        metadata: serde_json::Value,
        deadline: &Deadline,
    ) -> Result<String> {
        let memory_id = Self::content_hash(kind, text);

        if let Some(_existing) = self.store.memory_find_by_id(&memory_id).await? {
            self.store.memory_touch(&memory_id).await?;
            return Ok(memory_id);
        }

        let embedding_vector = self.embedding_client.embed_one(text, deadline).await?;
        let now = Utc::now();
        let memory = Memory {
            memory_id: memory_id.clone(),
            kind,
            text: text.to_string(),
            embedding_vector,
            metadata,
            use_count: 0,
            created_at: now,
            updated_at: now,
            last_used_at: None,
        };
        self.store.memory_insert(&memory).await?;
        Ok(memory_id)
    }

    /// Browse mode (empty/whitespace query) returns the top `k` by
    /// `(use_count desc, updated_at desc)` with similarity reported as
    /// 1.0; otherwise embeds `query`, filters by `min_similarity`, and
    /// marks every returned memory used.
    pub async fn recall(
        &self,
        query: &str,
        k: usize,
        kind_filter: Option<MemoryKind>,
        min_similarity: Option<f32>,
        deadline: &Deadline,
    ) -> Result<Vec<(Memory, f32)>> {
        if query.trim().is_empty() {
            let memories = self.store.memory_browse(k, kind_filter).await?;
            return Ok(memories.into_iter().map(|m| (m, 1.0)).collect());
        }

        let threshold = min_similarity.unwrap_or(self.default_min_similarity);
        let vector = self.embedding_client.embed_one(query, deadline).await?;
        let scored = self.store.memory_vector_top_k(&vector, k, kind_filter).await?;
        let filtered: Vec<(Memory, f32)> = scored
            .into_iter()
            .filter(|(_, similarity)| *similarity >= threshold)
            .collect();

        let ids: Vec<String> = filtered.iter().map(|(m, _)| m.memory_id.clone()).collect();
        if !ids.is_empty() {
            self.store.memory_mark_used(&ids).await?;
        }

        Ok(filtered)
    }

    pub async fn stats(&self) -> Result<MemoryStats> {
        self.store.memory_stats().await
    }

    pub async fn delete(&self, memory_id: &str) -> Result<bool> {
        self.store.memory_delete(memory_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeEmbeddingClient, FakeStore};

    fn service() -> MemoryService {
        MemoryService::new(
            Arc::new(FakeStore::new()),
            Arc::new(FakeEmbeddingClient::new(8)),
            0.5,
        )
    }

    #[tokio::test]
    async fn remembering_the_same_content_twice_increments_use_count() {
        let svc = service();
        let id1 = svc
            .remember(MemoryKind::Preference, "likes concise answers", serde_json::json!({}), &Deadline::none())
            .await
            .unwrap();
        let id2 = svc
            .remember(MemoryKind::Preference, "likes concise answers", serde_json::json!({}), &Deadline::none())
            .await
            .unwrap();
        assert_eq!(id1, id2);

        let stats = svc.stats().await.unwrap();
        let remembered = &stats.most_used[0];
        assert_eq!(remembered.use_count, 1);
    }

    #[tokio::test]
    async fn empty_query_returns_browse_mode_with_similarity_one() {
        let svc = service();
        svc.remember(MemoryKind::Knowledge, "aspirin inhibits platelet aggregation", serde_json::json!({}), &Deadline::none())
            .await
            .unwrap();

        let results = svc.recall("   ", 5, None, None, &Deadline::none()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1, 1.0);
    }

    #[tokio::test]
    async fn recall_marks_returned_memories_used() {
        let svc = service();
        svc.remember(MemoryKind::Correction, "dose was 10mg not 100mg", serde_json::json!({}), &Deadline::none())
            .await
            .unwrap();

        let results = svc
            .recall("dose was 10mg not 100mg", 5, None, Some(0.0), &Deadline::none())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.use_count, 1);
    }

    #[tokio::test]
    async fn delete_removes_the_memory() {
        let svc = service();
        let id = svc
            .remember(MemoryKind::Feedback, "prefers bullet points", serde_json::json!({}), &Deadline::none())
            .await
            .unwrap();
        assert!(svc.delete(&id).await.unwrap());
        assert!(!svc.delete(&id).await.unwrap());
    }
}
