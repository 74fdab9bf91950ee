//! HTTP embedding client (§4.2, §6): `POST {endpoint}/v1/embeddings`.
//!
//! Request: `{"input": [...], "model": "..."}`.
//! Response: `{"data": [{"embedding": [...]}, ...]}` in input order.
//!
//! `embed_batch` splits its input into chunks of at most `batch_size` items
//! and issues one request (with its own retry/backoff) per chunk, so a
//! caller passing an arbitrarily large slice never produces an oversized
//! request body.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cancellation::Deadline;
use crate::config::EmbeddingConfig;
use crate::error::{CoreError, Result};

use super::EmbeddingClient;

const BASE_BACKOFF: Duration = Duration::from_millis(500);
const BACKOFF_FACTOR: u32 = 2;
const MAX_ATTEMPTS: u32 = 4;
const PER_BATCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    endpoint_url: String,
    model_tag: String,
    dimension: usize,
    batch_size: usize,
    semaphore: std::sync::Arc<tokio::sync::Semaphore>,
}

impl HttpEmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint_url: config.endpoint_url.trim_end_matches('/').to_string(),
            model_tag: config.model_tag.clone(),
            dimension: config.dimension,
            batch_size: config.batch_size.max(1),
            semaphore: std::sync::Arc::new(tokio::sync::Semaphore::new(config.max_concurrency.max(1))),
        }
    }

    fn backoff_for_attempt(attempt: u32) -> Duration {
        let scaled = BASE_BACKOFF * BACKOFF_FACTOR.pow(attempt);
        let jitter_frac = rand::rng().random_range(-0.25..=0.25);
        let millis = scaled.as_millis() as f64 * (1.0 + jitter_frac);
        Duration::from_millis(millis.max(0.0) as u64)
    }

    async fn request_once(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            input: inputs.to_vec(),
            model: self.model_tag.clone(),
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.endpoint_url))
            .json(&body)
            .timeout(PER_BATCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| CoreError::EmbeddingUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::EmbeddingUnavailable(format!(
                "embedding service returned {}",
                response.status()
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| CoreError::EmbeddingUnavailable(e.to_string()))?;

        if parsed.data.len() != inputs.len() {
            return Err(CoreError::EmbeddingUnavailable(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                parsed.data.len()
            )));
        }

        parsed
            .data
            .into_iter()
            .map(|item| self.validate(item.embedding))
            .collect()
    }

    fn validate(&self, vec: Vec<f32>) -> Result<Vec<f32>> {
        if vec.len() != self.dimension {
            return Err(CoreError::EmbeddingUnavailable(format!(
                "expected dimension {}, got {}",
                self.dimension,
                vec.len()
            )));
        }
        let magnitude_sq: f32 = vec.iter().map(|x| x * x).sum();
        if magnitude_sq == 0.0 {
            return Err(CoreError::MockEmbedding(
                "embedding service returned a zero-magnitude vector".to_string(),
            ));
        }
        Ok(vec)
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, inputs: &[String], deadline: &Deadline) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(inputs.len());
        for chunk in inputs.chunks(self.batch_size) {
            vectors.extend(self.request_chunk_with_retry(chunk, deadline).await?);
        }
        Ok(vectors)
    }
}

impl HttpEmbeddingClient {
    /// Runs one chunk (at most `batch_size` inputs) through the retry/backoff
    /// loop. `embed_batch` calls this once per chunk so a single oversized
    /// request never exceeds the configured batch size (§4.2, §6).
    async fn request_chunk_with_retry(&self, chunk: &[String], deadline: &Deadline) -> Result<Vec<Vec<f32>>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| CoreError::EmbeddingUnavailable("semaphore closed".to_string()))?;

        let mut last_err = None;
        for attempt in 0..MAX_ATTEMPTS {
            if deadline.is_cancelled() {
                return Err(CoreError::DeadlineExceeded);
            }
            match deadline.race(self.request_once(chunk)).await {
                Ok(vectors) => return Ok(vectors),
                Err(CoreError::MockEmbedding(msg)) => {
                    // Never retry a mock/zero-magnitude detection — it is
                    // not a transient failure.
                    return Err(CoreError::MockEmbedding(msg));
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "embedding request failed, retrying");
                    last_err = Some(e);
                    if attempt + 1 < MAX_ATTEMPTS {
                        tokio::time::sleep(Self::backoff_for_attempt(attempt)).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or(CoreError::EmbeddingUnavailable("exhausted retries".to_string())))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::Deadline;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Echoes back one unit embedding per input string, so the test can
    /// assert on how many inputs arrived in each request body.
    struct EchoEmbeddings;

    impl Respond for EchoEmbeddings {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: EmbeddingRequest = request.body_json().unwrap();
            let data: Vec<_> = body
                .input
                .iter()
                .map(|_| EmbeddingDatum { embedding: vec![1.0, 0.0, 0.0] })
                .collect();
            ResponseTemplate::new(200).set_body_json(EmbeddingResponse { data })
        }
    }

    #[tokio::test]
    async fn embed_batch_chunks_by_configured_batch_size() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(EchoEmbeddings)
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            dimension: 3,
            model_tag: "test".to_string(),
            endpoint_url: server.uri(),
            batch_size: 2,
            max_concurrency: 4,
        };
        let client = HttpEmbeddingClient::new(&config);

        let inputs: Vec<String> = (0..5).map(|i| format!("input-{i}")).collect();
        let vectors = client.embed_batch(&inputs, &Deadline::none()).await.unwrap();

        assert_eq!(vectors.len(), 5);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3, "5 inputs at batch_size 2 is 3 requests (2, 2, 1)");
        for request in &requests {
            let body: EmbeddingRequest = request.body_json().unwrap();
            assert!(body.input.len() <= 2);
        }
    }

    #[test]
    fn backoff_grows_by_factor_two_within_jitter_band() {
        let b0 = HttpEmbeddingClient::backoff_for_attempt(0);
        let b1 = HttpEmbeddingClient::backoff_for_attempt(1);
        assert!(b0.as_millis() >= 375 && b0.as_millis() <= 625);
        assert!(b1.as_millis() >= 750 && b1.as_millis() <= 1250);
    }

    #[test]
    fn zero_magnitude_vector_is_rejected_as_mock() {
        let config = EmbeddingConfig {
            dimension: 3,
            model_tag: "test".to_string(),
            endpoint_url: "http://localhost".to_string(),
            batch_size: 1,
            max_concurrency: 1,
        };
        let client = HttpEmbeddingClient::new(&config);
        let err = client.validate(vec![0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, CoreError::MockEmbedding(_)));
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let config = EmbeddingConfig {
            dimension: 3,
            model_tag: "test".to_string(),
            endpoint_url: "http://localhost".to_string(),
            batch_size: 1,
            max_concurrency: 1,
        };
        let client = HttpEmbeddingClient::new(&config);
        let err = client.validate(vec![1.0, 0.0]).unwrap_err();
        assert!(matches!(err, CoreError::EmbeddingUnavailable(_)));
    }
}
