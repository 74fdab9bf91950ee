//! Store Adapter (C1): the capability-typed interface every Search Service,
//! the Sync Engine, and the Memory Store depend on, rather than on a
//! concrete database client (Design Note 9). The only shipped implementation
//! is Postgres+pgvector (`postgres::PgStore`); tests inject an in-memory
//! fake (`crate::testutil::FakeStore`) instead.

mod postgres;

pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Document, Entity, GraphStats, Image, Memory, MemoryKind, Relationship, SearchFilter};
use crate::error::Result;

/// Which vector-bearing table `vector_top_k` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorTable {
    Documents,
    Images,
}

/// A document mentioning a set of queried entities, ranked per §4.5 GraphSearch:
/// `(entity_match_count desc, sum(confidence) desc, document_id asc)`.
#[derive(Debug, Clone)]
pub struct EntityDocumentMatch {
    pub document_id: String,
    pub entity_match_count: usize,
    pub confidence_sum: f32,
}

/// Aggregate memory totals for `memory_stats` (§4.7).
#[derive(Debug, Clone, Default)]
pub struct MemoryStats {
    pub total: i64,
    pub by_kind: Vec<(String, i64)>,
    pub most_used: Vec<Memory>,
}

/// A `(document_id, source_last_modified)` pair used by the Sync Engine to
/// decide which documents need re-extraction.
#[derive(Debug, Clone)]
pub struct DocumentTimestamp {
    pub document_id: String,
    pub source_last_modified: DateTime<Utc>,
}

/// One entry of a patient's document timeline (§4.10).
#[derive(Debug, Clone)]
pub struct TimelineEvent {
    pub timestamp: DateTime<Utc>,
    pub document_id: String,
    pub document_type: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Idempotent creation of every table and index. Errors only for
    /// permission/connectivity failures (§4.1).
    async fn ensure_schema(&self) -> Result<()>;

    // -- Documents / Images ---------------------------------------------

    async fn insert_document(&self, doc: &Document) -> Result<()>;
    async fn upsert_document(&self, doc: &Document) -> Result<()>;
    async fn get_document(&self, document_id: &str) -> Result<Option<Document>>;
    async fn insert_image(&self, image: &Image) -> Result<()>;

    /// Cosine top-K over `table`, descending score, ties broken by id ascending.
    async fn vector_top_k(
        &self,
        table: VectorTable,
        query_vec: &[f32],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<(String, f32)>>;

    /// Keyword LIKE scan over **decoded** document text. `terms` are already
    /// lowercased by the caller. Overlap = count of terms present; ties
    /// broken by id ascending.
    async fn keyword_top_k(
        &self,
        terms: &[String],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<(String, i64)>>;

    // -- Knowledge graph ---------------------------------------------------

    /// Case-insensitive substring match against entity text.
    async fn entities_by_text(&self, substrings: &[String], limit: usize) -> Result<Vec<Entity>>;

    /// BFS neighbors up to `depth` hops (1..=3), cycle-safe via a visited set.
    /// Returns the seed entity plus every discovered neighbor, and the
    /// deduplicated edges connecting them.
    async fn entities_neighbors(
        &self,
        entity_id: i64,
        depth: u8,
        limit: usize,
    ) -> Result<(Vec<Entity>, Vec<Relationship>)>;

    async fn graph_stats(&self) -> Result<GraphStats>;

    /// Documents mentioning any of `entity_ids`, ranked per §4.5 GraphSearch.
    async fn documents_mentioning_entities(
        &self,
        entity_ids: &[i64],
        k: usize,
    ) -> Result<Vec<EntityDocumentMatch>>;

    /// Atomically replace every entity/relationship sourced from
    /// `document_id` with a freshly extracted set (C4's delete-then-insert
    /// pattern, within one transaction).
    async fn replace_document_entities(
        &self,
        document_id: &str,
        entities: &[Entity],
        relationships: &[Relationship],
    ) -> Result<()>;

    /// The maximum `entity.created_at` across all entities — the Sync
    /// Engine's extraction watermark.
    async fn extraction_watermark(&self) -> Result<Option<DateTime<Utc>>>;

    /// Documents whose `source_last_modified` exceeds `watermark` (or every
    /// document, if `watermark` is `None`), up to `limit`.
    async fn documents_modified_since(
        &self,
        watermark: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<DocumentTimestamp>>;

    // -- Memory -------------------------------------------------------------

    async fn memory_find_by_id(&self, memory_id: &str) -> Result<Option<Memory>>;
    async fn memory_insert(&self, memory: &Memory) -> Result<()>;
    /// Increment `use_count` and refresh `updated_at` for an existing memory
    /// (the "reinforce an existing correction" path of `remember`).
    async fn memory_touch(&self, memory_id: &str) -> Result<Memory>;
    async fn memory_vector_top_k(
        &self,
        query_vec: &[f32],
        k: usize,
        kind_filter: Option<MemoryKind>,
    ) -> Result<Vec<(Memory, f32)>>;
    /// Browse mode: ordered by `(use_count desc, updated_at desc)`.
    async fn memory_browse(&self, k: usize, kind_filter: Option<MemoryKind>) -> Result<Vec<Memory>>;
    /// Mark a set of recalled memories as used: `use_count += 1`, `last_used_at = now`.
    async fn memory_mark_used(&self, memory_ids: &[String]) -> Result<()>;
    async fn memory_stats(&self) -> Result<MemoryStats>;
    async fn memory_delete(&self, memory_id: &str) -> Result<bool>;

    // -- Visualization ------------------------------------------------------

    async fn patient_timeline(&self, patient_id: &str) -> Result<Vec<TimelineEvent>>;
}
