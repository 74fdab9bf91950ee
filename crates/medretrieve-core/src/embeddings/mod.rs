//! Embedding Client (C2): the capability-typed boundary between retrieval
//! logic and whatever embedding service is configured. The only shipped
//! implementation calls an HTTP endpoint (`http::HttpEmbeddingClient`); tests
//! inject `crate::testutil::FakeEmbeddingClient` instead.

mod http;

pub use http::HttpEmbeddingClient;

use async_trait::async_trait;

use crate::cancellation::Deadline;
use crate::error::Result;

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// The dimension every returned vector must have.
    fn dimension(&self) -> usize;

    /// Embed a batch of strings, preserving input order. Retries per §4.2
    /// are internal to the implementation; callers see only the final
    /// outcome or a `DeadlineExceeded`/`EmbeddingUnavailable`/`MockEmbedding`
    /// error.
    async fn embed_batch(&self, inputs: &[String], deadline: &Deadline) -> Result<Vec<Vec<f32>>>;

    /// Convenience wrapper for a single string.
    async fn embed_one(&self, input: &str, deadline: &Deadline) -> Result<Vec<f32>> {
        let mut out = self.embed_batch(std::slice::from_ref(&input.to_string()), deadline).await?;
        Ok(out.remove(0))
    }
}
