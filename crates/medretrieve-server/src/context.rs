//! Shared server state: one instance per process, cloned (via `Arc`) into
//! every request's tool dispatch.

use std::sync::Arc;

use medretrieve_core::config::Config;
use medretrieve_core::embeddings::{EmbeddingClient, HttpEmbeddingClient};
use medretrieve_core::memory::MemoryService;
use medretrieve_core::search::{GraphSearch, KeywordTextSearch, VectorImageSearch, VectorTextSearch};
use medretrieve_core::store::{PgStore, Store};
use medretrieve_core::viz::VizBuilder;

pub struct ServerContext {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub embedding_client: Arc<dyn EmbeddingClient>,
    pub memory: MemoryService,
    pub vector_text: VectorTextSearch,
    pub vector_image: VectorImageSearch,
    pub keyword_text: KeywordTextSearch,
    pub graph: GraphSearch,
    pub viz: VizBuilder,
}

impl ServerContext {
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn Store> = Arc::new(
            PgStore::connect(&config.store.dsn, config.store.pool_size, config.embedding.dimension).await?,
        );
        store.ensure_schema().await?;

        let embedding_client: Arc<dyn EmbeddingClient> =
            Arc::new(HttpEmbeddingClient::new(&config.embedding));

        let memory = MemoryService::new(
            store.clone(),
            embedding_client.clone(),
            config.memory.min_similarity,
        );
        let vector_text = VectorTextSearch::new(store.clone(), embedding_client.clone());
        let vector_image = VectorImageSearch::new(store.clone(), embedding_client.clone());
        let keyword_text = KeywordTextSearch::new(store.clone());
        let graph = GraphSearch::new(store.clone());
        let viz = VizBuilder::new(store.clone());

        Ok(Self {
            config,
            store,
            embedding_client,
            memory,
            vector_text,
            vector_image,
            keyword_text,
            graph,
            viz,
        })
    }
}
