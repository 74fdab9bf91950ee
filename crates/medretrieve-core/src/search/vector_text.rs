use std::sync::Arc;

use async_trait::async_trait;

use crate::cancellation::Deadline;
use crate::domain::SearchFilter;
use crate::embeddings::EmbeddingClient;
use crate::error::Result;
use crate::store::{Store, VectorTable};

use super::{rank_from_scored, RankedList, SearchService};

/// Embeds the query and ranks documents by cosine similarity.
pub struct VectorTextSearch {
    store: Arc<dyn Store>,
    embedding_client: Arc<dyn EmbeddingClient>,
}

impl VectorTextSearch {
    pub fn new(store: Arc<dyn Store>, embedding_client: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            store,
            embedding_client,
        }
    }
}

#[async_trait]
impl SearchService for VectorTextSearch {
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: &SearchFilter,
        deadline: &Deadline,
    ) -> Result<RankedList> {
        let vector = self.embedding_client.embed_one(query, deadline).await?;
        let scored = deadline
            .race(self.store.vector_top_k(VectorTable::Documents, &vector, k, filter))
            .await?;
        Ok(rank_from_scored(scored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeEmbeddingClient, FakeStore};

    #[tokio::test]
    async fn ranks_by_similarity_to_query() {
        let store = Arc::new(FakeStore::new());
        let embedder: Arc<dyn EmbeddingClient> = Arc::new(FakeEmbeddingClient::new(8));
        store
            .seed_document_with_vector("doc-a", "chest pain", embedder.embed_one("chest pain", &Deadline::none()).await.unwrap())
            .await;
        store
            .seed_document_with_vector("doc-b", "unrelated text", embedder.embed_one("unrelated text", &Deadline::none()).await.unwrap())
            .await;

        let service = VectorTextSearch::new(store, embedder);
        let results = service
            .search("chest pain", 2, &SearchFilter::default(), &Deadline::none())
            .await
            .unwrap();

        assert_eq!(results[0].id, "doc-a");
        assert_eq!(results[0].rank, 1);
    }
}
