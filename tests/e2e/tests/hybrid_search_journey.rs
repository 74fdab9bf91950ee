//! End-to-end journey: ingest documents, run each Search Service against an
//! in-memory store, fuse with RRF, and check the merged ordering makes
//! sense relative to each individual list.

use std::sync::Arc;

use chrono::Utc;
use medretrieve_core::cancellation::Deadline;
use medretrieve_core::domain::SearchFilter;
use medretrieve_core::fusion::reciprocal_rank_fusion;
use medretrieve_core::search::{KeywordTextSearch, SearchService, VectorTextSearch};
use medretrieve_core::testutil::{FakeEmbeddingClient, FakeStore};

#[tokio::test]
async fn vector_and_keyword_results_fuse_into_one_ranking() {
    let store = Arc::new(FakeStore::new());
    let embedder: Arc<dyn medretrieve_core::embeddings::EmbeddingClient> =
        Arc::new(FakeEmbeddingClient::new(16));
    let deadline = Deadline::none();

    let chest_pain_vec = embedder.embed_one("patient reports chest pain", &deadline).await.unwrap();
    let fatigue_vec = embedder.embed_one("patient reports fatigue", &deadline).await.unwrap();

    store
        .seed_document_with_vector("doc-chest", "patient reports chest pain and shortness of breath", chest_pain_vec)
        .await;
    store
        .seed_document_with_vector("doc-fatigue", "patient reports persistent fatigue", fatigue_vec)
        .await;

    let vector_search = VectorTextSearch::new(store.clone(), embedder.clone());
    let keyword_search = KeywordTextSearch::new(store.clone());
    let filter = SearchFilter::default();

    let vector_ranked = vector_search
        .search("chest pain", 10, &filter, &deadline)
        .await
        .unwrap();
    let keyword_ranked = keyword_search
        .search("chest pain", 10, &filter, &deadline)
        .await
        .unwrap();

    assert_eq!(vector_ranked[0].id, "doc-chest");
    assert_eq!(keyword_ranked[0].id, "doc-chest");

    let lists = vec![
        vector_ranked.iter().map(|r| r.id.clone()).collect(),
        keyword_ranked.iter().map(|r| r.id.clone()).collect(),
    ];
    let fused = reciprocal_rank_fusion(&lists, 60.0, 10);

    assert_eq!(fused[0].id, "doc-chest");
    assert_eq!(fused[0].lists_containing, 2);
}

#[tokio::test]
async fn a_failed_component_contributes_nothing_to_fusion() {
    let store = Arc::new(FakeStore::new());
    store.seed_document("doc-1", "fever and cough", Utc::now()).await;

    let keyword_search = KeywordTextSearch::new(store);
    let deadline = Deadline::none();
    let ranked = keyword_search
        .search("fever", 10, &SearchFilter::default(), &deadline)
        .await
        .unwrap();

    // Simulate a failed sibling service: an empty list.
    let lists = vec![ranked.iter().map(|r| r.id.clone()).collect(), Vec::new()];
    let fused = reciprocal_rank_fusion(&lists, 60.0, 10);
    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].id, "doc-1");
}
