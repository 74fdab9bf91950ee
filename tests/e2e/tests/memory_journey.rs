//! End-to-end journey over `MemoryService`: remembering reinforces existing
//! facts instead of duplicating them, recall marks the returned memories
//! used, and an empty query falls back to browse-by-recency-and-use.

use std::sync::Arc;

use medretrieve_core::cancellation::Deadline;
use medretrieve_core::domain::MemoryKind;
use medretrieve_core::memory::MemoryService;
use medretrieve_core::testutil::{FakeEmbeddingClient, FakeStore};

fn service() -> MemoryService {
    let store = Arc::new(FakeStore::new());
    let embedder = Arc::new(FakeEmbeddingClient::new(16));
    MemoryService::new(store, embedder, 0.0)
}

#[tokio::test]
async fn remembering_the_same_fact_twice_reinforces_rather_than_duplicates() {
    let memory = service();
    let deadline = Deadline::none();

    let id1 = memory
        .remember(MemoryKind::Preference, "patient prefers morning appointments", serde_json::json!({}), &deadline)
        .await
        .unwrap();
    let id2 = memory
        .remember(MemoryKind::Preference, "patient prefers morning appointments", serde_json::json!({}), &deadline)
        .await
        .unwrap();

    assert_eq!(id1, id2);

    let stats = memory.stats().await.unwrap();
    assert_eq!(stats.total, 1);
}

#[tokio::test]
async fn recall_marks_returned_memories_as_used_and_empty_query_browses() {
    let memory = service();
    let deadline = Deadline::none();

    memory
        .remember(MemoryKind::Knowledge, "patient has a penicillin allergy", serde_json::json!({}), &deadline)
        .await
        .unwrap();
    memory
        .remember(MemoryKind::Knowledge, "patient takes metformin daily", serde_json::json!({}), &deadline)
        .await
        .unwrap();

    let recalled = memory
        .recall("penicillin allergy", 5, None, None, &deadline)
        .await
        .unwrap();
    assert!(!recalled.is_empty());
    assert_eq!(recalled[0].0.text, "patient has a penicillin allergy");

    // Browse mode: blank query returns everything ranked by use then recency,
    // and similarity is reported as 1.0 per the browse contract.
    let browsed = memory.recall("", 10, None, None, &deadline).await.unwrap();
    assert_eq!(browsed.len(), 2);
    assert_eq!(browsed[0].0.text, "patient has a penicillin allergy");
    assert!((browsed[0].1 - 1.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn deleting_a_memory_removes_it_from_recall() {
    let memory = service();
    let deadline = Deadline::none();

    let id = memory
        .remember(MemoryKind::Knowledge, "patient is allergic to latex", serde_json::json!({}), &deadline)
        .await
        .unwrap();
    memory.delete(&id).await.unwrap();

    let stats = memory.stats().await.unwrap();
    assert_eq!(stats.total, 0);
}
