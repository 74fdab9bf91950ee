//! Typed configuration (spec §6, Design Note 9).
//!
//! Replaces the "dynamically typed config dict" anti-pattern the source
//! exhibited: every key spec §6 enumerates is a field here, loaded once at
//! startup from a single TOML file. `#[serde(deny_unknown_fields)]` on each
//! section turns a typo'd key into a startup error instead of a silent no-op.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// `embedding.dimension` — D, must match the store schema.
    pub dimension: usize,
    /// `embedding.model_tag` — recorded with each vector for provenance.
    pub model_tag: String,
    /// `embedding.endpoint_url` — embedding service base URL.
    pub endpoint_url: String,
    /// `embedding.batch_size` — max items per HTTP request; `embed_batch`
    /// chunks its input to this size.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// `embedding.max_concurrency` — in-flight cap.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_batch_size() -> usize {
    32
}
fn default_max_concurrency() -> usize {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// `store.dsn` — DB connection string.
    pub dsn: String,
    /// `store.pool_size` — connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_pool_size() -> u32 {
    16
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RrfConfig {
    /// `rrf.k` — fusion constant.
    #[serde(default = "default_rrf_k")]
    pub k: f32,
}

impl Default for RrfConfig {
    fn default() -> Self {
        Self { k: default_rrf_k() }
    }
}

fn default_rrf_k() -> f32 {
    60.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// `search.default_top_k`
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    /// `search.max_top_k` — hard cap.
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    10
}
fn default_max_top_k() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// `sync.batch_window` — max docs per run.
    pub batch_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// `memory.min_similarity` — default similarity floor for `recall`.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            min_similarity: default_min_similarity(),
        }
    }
}

fn default_min_similarity() -> f32 {
    0.5
}

/// Root configuration record, deserialized from a single TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub rrf: RrfConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub sync: SyncConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parse a TOML document. Unknown top-level or section keys are a hard
    /// error rather than being silently ignored.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Load from a file path on disk.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [embedding]
        dimension = 1024
        model_tag = "clinical-embed-v1"
        endpoint_url = "http://localhost:8090"

        [store]
        dsn = "postgres://localhost/medretrieve"

        [sync]
        batch_window = 500
    "#;

    #[test]
    fn parses_required_fields_and_applies_defaults() {
        let cfg = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cfg.embedding.dimension, 1024);
        assert_eq!(cfg.embedding.batch_size, 32);
        assert_eq!(cfg.embedding.max_concurrency, 8);
        assert_eq!(cfg.store.pool_size, 16);
        assert_eq!(cfg.rrf.k, 60.0);
        assert_eq!(cfg.search.default_top_k, 10);
        assert_eq!(cfg.search.max_top_k, 100);
        assert_eq!(cfg.memory.min_similarity, 0.5);
    }

    #[test]
    fn unknown_key_is_a_hard_error() {
        let bad = format!("{SAMPLE}\n[embedding]\nbogus_key = 1\n");
        assert!(Config::from_toml_str(&bad).is_err());
    }
}
