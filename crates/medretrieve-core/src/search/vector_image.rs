use std::sync::Arc;

use async_trait::async_trait;

use crate::cancellation::Deadline;
use crate::domain::SearchFilter;
use crate::embeddings::EmbeddingClient;
use crate::error::Result;
use crate::store::{Store, VectorTable};

use super::{rank_from_scored, RankedList, SearchService};

/// An image-search query: either free text (embedded into the joint
/// text/image space) or raw image bytes, per §4.5.
#[derive(Debug, Clone)]
pub enum ImageQuery {
    Text(String),
    Bytes(Vec<u8>),
}

/// Embeds a text query or image bytes, ranks images by cosine similarity.
pub struct VectorImageSearch {
    store: Arc<dyn Store>,
    embedding_client: Arc<dyn EmbeddingClient>,
}

impl VectorImageSearch {
    pub fn new(store: Arc<dyn Store>, embedding_client: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            store,
            embedding_client,
        }
    }

    /// `SearchService::search` only carries a text `query`; callers with
    /// raw image bytes (the Tool Server's `search_images` with an
    /// `image_ref`) use this directly instead.
    pub async fn search_query(
        &self,
        query: ImageQuery,
        k: usize,
        filter: &SearchFilter,
        deadline: &Deadline,
    ) -> Result<RankedList> {
        let vector = match query {
            ImageQuery::Text(text) => self.embedding_client.embed_one(&text, deadline).await?,
            ImageQuery::Bytes(bytes) => {
                // The embedding endpoint accepts base64-encoded image input
                // in the same `input` field as text (§6).
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
                self.embedding_client.embed_one(&encoded, deadline).await?
            }
        };
        let scored = deadline
            .race(self.store.vector_top_k(VectorTable::Images, &vector, k, filter))
            .await?;
        Ok(rank_from_scored(scored))
    }
}

#[async_trait]
impl SearchService for VectorImageSearch {
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: &SearchFilter,
        deadline: &Deadline,
    ) -> Result<RankedList> {
        self.search_query(ImageQuery::Text(query.to_string()), k, filter, deadline)
            .await
    }
}
