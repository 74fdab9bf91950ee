//! Sync Engine (C4): incremental entity/relationship extraction driven by a
//! watermark on `Document.source_last_modified`.
//!
//! Modes mirror the spec's four CLI-style operations: `init`, `build`,
//! `sync`, `stats`. Per-document processing is atomic (the Store's
//! `replace_document_entities` runs the delete-then-insert in one
//! transaction); one document's failure never aborts the batch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::entities::EntityExtractor;
use crate::error::Result;
use crate::store::Store;

/// Outcome of a single `build`/`sync` run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub processed: usize,
    pub failed: Vec<String>,
    pub new_watermark: Option<DateTime<Utc>>,
}

/// Aggregate counters for the `stats` mode.
#[derive(Debug, Clone)]
pub struct SyncStats {
    pub watermark: Option<DateTime<Utc>>,
    pub total_entities: i64,
}

pub struct SyncEngine {
    store: Arc<dyn Store>,
    extractor: EntityExtractor,
    batch_window: usize,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn Store>, batch_window: usize) -> Self {
        Self {
            store,
            extractor: EntityExtractor::new(),
            batch_window,
        }
    }

    /// `init` mode: create schema idempotently.
    pub async fn init(&self) -> Result<()> {
        self.store.ensure_schema().await
    }

    /// `build` mode: process every document regardless of watermark.
    pub async fn build(&self) -> Result<SyncReport> {
        self.process_since(None).await
    }

    /// `sync` mode: process only documents whose `source_last_modified`
    /// exceeds the current watermark.
    pub async fn sync(&self) -> Result<SyncReport> {
        let watermark = self.store.extraction_watermark().await?;
        self.process_since(watermark).await
    }

    /// `stats` mode.
    pub async fn stats(&self) -> Result<SyncStats> {
        let watermark = self.store.extraction_watermark().await?;
        let graph_stats = self.store.graph_stats().await?;
        Ok(SyncStats {
            watermark,
            total_entities: graph_stats.total_entities,
        })
    }

    async fn process_since(&self, watermark: Option<DateTime<Utc>>) -> Result<SyncReport> {
        let due = self
            .store
            .documents_modified_since(watermark, self.batch_window)
            .await?;

        let mut report = SyncReport::default();
        let mut max_modified = watermark;

        for doc_ts in &due {
            match self.process_one(&doc_ts.document_id).await {
                Ok(()) => {
                    report.processed += 1;
                    max_modified = Some(match max_modified {
                        Some(current) => current.max(doc_ts.source_last_modified),
                        None => doc_ts.source_last_modified,
                    });
                    info!(document_id = %doc_ts.document_id, "extraction complete");
                }
                Err(e) => {
                    // A single document's failure is logged and retried on
                    // the next run, never aborts the batch (§4.4).
                    error!(document_id = %doc_ts.document_id, error = %e, "extraction failed, will retry next run");
                    report.failed.push(doc_ts.document_id.clone());
                }
            }
        }

        if !report.failed.is_empty() {
            warn!(count = report.failed.len(), "documents failed extraction this run");
        }

        report.new_watermark = max_modified;
        Ok(report)
    }

    async fn process_one(&self, document_id: &str) -> Result<()> {
        let doc = self
            .store
            .get_document(document_id)
            .await?
            .ok_or_else(|| crate::error::CoreError::NotFound(document_id.to_string()))?;

        let (entities, relationships) = self.extractor.extract(document_id, &doc.decoded_text);
        self.store
            .replace_document_entities(document_id, &entities, &relationships)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeStore;
    use chrono::Duration;

    #[tokio::test]
    async fn build_processes_every_document_and_advances_watermark() {
        let store = Arc::new(FakeStore::new());
        let now = Utc::now();
        store
            .seed_document("doc-1", "chest pain and fever", now - Duration::hours(2))
            .await;
        store
            .seed_document("doc-2", "prescribed aspirin", now - Duration::hours(1))
            .await;

        let engine = SyncEngine::new(store.clone(), 100);
        let report = engine.build().await.unwrap();

        assert_eq!(report.processed, 2);
        assert!(report.failed.is_empty());
        let stats = engine.stats().await.unwrap();
        assert!(stats.total_entities > 0);
    }

    #[tokio::test]
    async fn relationship_endpoints_resolve_to_that_document_s_own_entities() {
        // Seed two unrelated documents first so their entities occupy the
        // same small id range (1, 2, 3, ...) that a position-keyed (rather
        // than entity-id-keyed) remap could collide with.
        let store = Arc::new(FakeStore::new());
        let now = Utc::now();
        store.seed_document("doc-a", "chest pain", now - Duration::hours(3)).await;
        store.seed_document("doc-b", "aspirin", now - Duration::hours(2)).await;

        let engine = SyncEngine::new(store.clone(), 100);
        engine.build().await.unwrap();

        // Three non-overlapping entities -> three CO_OCCURS_WITH edges whose
        // endpoints must reference this document's own entities, never a
        // position index (1, 2, 3) misread as another document's entity id.
        store
            .seed_document("doc-c", "patient reports fatigue and headache today", now - Duration::hours(1))
            .await;
        let report = engine.sync().await.unwrap();
        assert_eq!(report.processed, 1);

        let fatigue = store
            .entities_by_text(&["fatigue".to_string()], 10)
            .await
            .unwrap();
        assert_eq!(fatigue.len(), 1);
        assert_eq!(fatigue[0].source_document_id, "doc-c");

        let (neighbors, edges) = store.entities_neighbors(fatigue[0].entity_id, 1, 10).await.unwrap();
        assert_eq!(edges.len(), 2, "fatigue co-occurs with headache and today");
        for neighbor in &neighbors {
            assert_eq!(
                neighbor.source_document_id, "doc-c",
                "relationship endpoint leaked into another document's entity"
            );
        }
        for edge in &edges {
            assert_eq!(edge.source_document_id, "doc-c");
            assert_ne!(edge.source_entity_id, edge.target_entity_id);
        }
    }

    #[tokio::test]
    async fn sync_twice_with_no_changes_is_idempotent() {
        let store = Arc::new(FakeStore::new());
        let now = Utc::now();
        store.seed_document("doc-1", "chest pain", now).await;

        let engine = SyncEngine::new(store.clone(), 100);
        engine.build().await.unwrap();
        let first_stats = engine.stats().await.unwrap();

        let second = engine.sync().await.unwrap();
        assert_eq!(second.processed, 0);
        let second_stats = engine.stats().await.unwrap();
        assert_eq!(first_stats.total_entities, second_stats.total_entities);
    }
}
