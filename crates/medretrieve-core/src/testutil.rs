//! In-memory fakes for the capability traits (Design Note 9), so fusion,
//! entity extraction, sync watermarking, and memory recall are unit
//! testable without a live Postgres instance or embedding endpoint.
//!
//! Gated by `test-support` so `tests/e2e` can depend on this crate with the
//! feature enabled instead of duplicating fakes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::cancellation::Deadline;
use crate::domain::{
    Document, Entity, GraphStats, Image, Memory, MemoryKind, Relationship, SearchFilter,
};
use crate::embeddings::EmbeddingClient;
use crate::error::{CoreError, Result};
use crate::store::{
    DocumentTimestamp, EntityDocumentMatch, MemoryStats, Store, TimelineEvent, VectorTable,
};

#[derive(Default)]
struct State {
    documents: HashMap<String, Document>,
    images: HashMap<String, Image>,
    entities: HashMap<i64, Entity>,
    relationships: HashMap<i64, Relationship>,
    memories: HashMap<String, Memory>,
}

pub struct FakeStore {
    state: Mutex<State>,
    next_entity_id: AtomicI64,
    next_relationship_id: AtomicI64,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            next_entity_id: AtomicI64::new(1),
            next_relationship_id: AtomicI64::new(1),
        }
    }

    /// Test convenience: insert a document with a deterministic zero vector
    /// (dimension-agnostic, since the fake never checks D) at the given
    /// `source_last_modified`.
    pub async fn seed_document(&self, document_id: &str, text: &str, modified: DateTime<Utc>) {
        let doc = Document {
            document_id: document_id.to_string(),
            patient_id: "patient-1".to_string(),
            document_type: "note".to_string(),
            decoded_text: text.to_string(),
            source_ref: format!("ref://{document_id}"),
            embedding_vector: vec![0.1, 0.2, 0.3],
            embedding_model_tag: "test-model".to_string(),
            created_at: modified,
            source_last_modified: modified,
        };
        self.state.lock().await.documents.insert(document_id.to_string(), doc);
    }

    pub async fn seed_document_with_vector(&self, document_id: &str, text: &str, vector: Vec<f32>) {
        let now = Utc::now();
        let doc = Document {
            document_id: document_id.to_string(),
            patient_id: "patient-1".to_string(),
            document_type: "note".to_string(),
            decoded_text: text.to_string(),
            source_ref: format!("ref://{document_id}"),
            embedding_vector: vector,
            embedding_model_tag: "test-model".to_string(),
            created_at: now,
            source_last_modified: now,
        };
        self.state.lock().await.documents.insert(document_id.to_string(), doc);
    }
}

impl Default for FakeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_document(&self, doc: &Document) -> Result<()> {
        self.state.lock().await.documents.insert(doc.document_id.clone(), doc.clone());
        Ok(())
    }

    async fn upsert_document(&self, doc: &Document) -> Result<()> {
        self.state.lock().await.documents.insert(doc.document_id.clone(), doc.clone());
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        Ok(self.state.lock().await.documents.get(document_id).cloned())
    }

    async fn insert_image(&self, image: &Image) -> Result<()> {
        self.state.lock().await.images.insert(image.image_id.clone(), image.clone());
        Ok(())
    }

    async fn vector_top_k(
        &self,
        table: VectorTable,
        query_vec: &[f32],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<(String, f32)>> {
        let state = self.state.lock().await;
        let mut scored: Vec<(String, f32)> = match table {
            VectorTable::Documents => state
                .documents
                .values()
                .filter(|d| filter.patient_id.as_deref().map_or(true, |p| p == d.patient_id))
                .filter(|d| filter.document_type.as_deref().map_or(true, |t| t == d.document_type))
                .map(|d| (d.document_id.clone(), cosine(query_vec, &d.embedding_vector)))
                .collect(),
            VectorTable::Images => state
                .images
                .values()
                .filter(|i| filter.patient_id.as_deref().map_or(true, |p| p == i.patient_id))
                .map(|i| (i.image_id.clone(), cosine(query_vec, &i.embedding_vector)))
                .collect(),
        };
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    async fn keyword_top_k(
        &self,
        terms: &[String],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<(String, i64)>> {
        let state = self.state.lock().await;
        let mut scored: Vec<(String, i64)> = state
            .documents
            .values()
            .filter(|d| filter.patient_id.as_deref().map_or(true, |p| p == d.patient_id))
            .filter(|d| filter.document_type.as_deref().map_or(true, |t| t == d.document_type))
            .map(|d| {
                let lower = d.decoded_text.to_lowercase();
                let overlap = terms.iter().filter(|t| lower.contains(t.as_str())).count() as i64;
                (d.document_id.clone(), overlap)
            })
            .filter(|(_, overlap)| *overlap > 0)
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    async fn entities_by_text(&self, substrings: &[String], limit: usize) -> Result<Vec<Entity>> {
        let state = self.state.lock().await;
        let mut matches: Vec<Entity> = state
            .entities
            .values()
            .filter(|e| {
                substrings
                    .iter()
                    .any(|s| e.text.to_lowercase().contains(&s.to_lowercase()))
            })
            .cloned()
            .collect();
        matches.sort_by_key(|e| e.entity_id);
        matches.truncate(limit);
        Ok(matches)
    }

    async fn entities_neighbors(
        &self,
        entity_id: i64,
        depth: u8,
        limit: usize,
    ) -> Result<(Vec<Entity>, Vec<Relationship>)> {
        let state = self.state.lock().await;
        let Some(seed) = state.entities.get(&entity_id).cloned() else {
            return Ok((Vec::new(), Vec::new()));
        };

        let mut visited = std::collections::HashSet::from([entity_id]);
        let mut frontier = std::collections::VecDeque::from([(entity_id, 0u8)]);
        let mut nodes = vec![seed];
        let mut edges: Vec<Relationship> = Vec::new();
        let mut edge_ids = std::collections::HashSet::new();

        while let Some((current, hop)) = frontier.pop_front() {
            if hop >= depth {
                continue;
            }
            for rel in state.relationships.values() {
                if rel.source_entity_id != current && rel.target_entity_id != current {
                    continue;
                }
                if edge_ids.insert(rel.relationship_id) {
                    edges.push(rel.clone());
                }
                let neighbor = if rel.source_entity_id == current {
                    rel.target_entity_id
                } else {
                    rel.source_entity_id
                };
                if visited.insert(neighbor) {
                    if let Some(e) = state.entities.get(&neighbor) {
                        nodes.push(e.clone());
                    }
                    frontier.push_back((neighbor, hop + 1));
                }
            }
            if nodes.len() >= limit {
                break;
            }
        }

        nodes.truncate(limit.max(1));
        Ok((nodes, edges))
    }

    async fn graph_stats(&self) -> Result<GraphStats> {
        let state = self.state.lock().await;
        let mut by_type: HashMap<String, i64> = HashMap::new();
        for e in state.entities.values() {
            *by_type.entry(e.entity_type.as_str().to_string()).or_insert(0) += 1;
        }
        let mut by_kind: HashMap<String, i64> = HashMap::new();
        for r in state.relationships.values() {
            *by_kind.entry(r.kind.as_str().to_string()).or_insert(0) += 1;
        }
        let mut by_type: Vec<(String, i64)> = by_type.into_iter().collect();
        by_type.sort();
        let mut by_relationship_kind: Vec<(String, i64)> = by_kind.into_iter().collect();
        by_relationship_kind.sort();

        Ok(GraphStats {
            total_entities: state.entities.len() as i64,
            by_type,
            by_relationship_kind,
        })
    }

    async fn documents_mentioning_entities(
        &self,
        entity_ids: &[i64],
        k: usize,
    ) -> Result<Vec<EntityDocumentMatch>> {
        let state = self.state.lock().await;
        let wanted: std::collections::HashSet<i64> = entity_ids.iter().copied().collect();
        let mut per_doc: HashMap<String, (usize, f32)> = HashMap::new();
        for e in state.entities.values() {
            if wanted.contains(&e.entity_id) {
                let entry = per_doc.entry(e.source_document_id.clone()).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += e.confidence;
            }
        }
        let mut out: Vec<EntityDocumentMatch> = per_doc
            .into_iter()
            .map(|(document_id, (count, sum))| EntityDocumentMatch {
                document_id,
                entity_match_count: count,
                confidence_sum: sum,
            })
            .collect();
        out.sort_by(|a, b| {
            b.entity_match_count
                .cmp(&a.entity_match_count)
                .then(b.confidence_sum.partial_cmp(&a.confidence_sum).unwrap())
                .then(a.document_id.cmp(&b.document_id))
        });
        out.truncate(k);
        Ok(out)
    }

    async fn replace_document_entities(
        &self,
        document_id: &str,
        entities: &[Entity],
        relationships: &[Relationship],
    ) -> Result<()> {
        let mut state = self.state.lock().await;

        state.entities.retain(|_, e| e.source_document_id != document_id);
        state.relationships.retain(|_, r| r.source_document_id != document_id);

        // Keyed by position in `entities`, not `entity.entity_id` (always 0
        // for freshly extracted candidates) — see the matching comment in
        // `store::postgres::PgStore::replace_document_entities`.
        let mut id_map = HashMap::new();
        for (position, entity) in entities.iter().enumerate() {
            let new_id = self.next_entity_id.fetch_add(1, Ordering::SeqCst);
            id_map.insert(position as i64, new_id);
            let mut e = entity.clone();
            e.entity_id = new_id;
            state.entities.insert(new_id, e);
        }

        for rel in relationships {
            let source = *id_map.get(&rel.source_entity_id).unwrap_or(&rel.source_entity_id);
            let target = *id_map.get(&rel.target_entity_id).unwrap_or(&rel.target_entity_id);
            let new_id = self.next_relationship_id.fetch_add(1, Ordering::SeqCst);
            let canonical = Relationship {
                relationship_id: new_id,
                source_entity_id: source,
                target_entity_id: target,
                kind: rel.kind,
                confidence: rel.confidence,
                source_document_id: document_id.to_string(),
            }
            .canonicalize();
            state.relationships.insert(new_id, canonical);
        }

        Ok(())
    }

    async fn extraction_watermark(&self) -> Result<Option<DateTime<Utc>>> {
        let state = self.state.lock().await;
        Ok(state.entities.values().map(|e| e.created_at).max())
    }

    async fn documents_modified_since(
        &self,
        watermark: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<DocumentTimestamp>> {
        let state = self.state.lock().await;
        let mut docs: Vec<DocumentTimestamp> = state
            .documents
            .values()
            .filter(|d| watermark.map_or(true, |wm| d.source_last_modified > wm))
            .map(|d| DocumentTimestamp {
                document_id: d.document_id.clone(),
                source_last_modified: d.source_last_modified,
            })
            .collect();
        docs.sort_by_key(|d| d.source_last_modified);
        docs.truncate(limit);
        Ok(docs)
    }

    async fn memory_find_by_id(&self, memory_id: &str) -> Result<Option<Memory>> {
        Ok(self.state.lock().await.memories.get(memory_id).cloned())
    }

    async fn memory_insert(&self, memory: &Memory) -> Result<()> {
        self.state.lock().await.memories.insert(memory.memory_id.clone(), memory.clone());
        Ok(())
    }

    async fn memory_touch(&self, memory_id: &str) -> Result<Memory> {
        let mut state = self.state.lock().await;
        let memory = state
            .memories
            .get_mut(memory_id)
            .ok_or_else(|| CoreError::NotFound(format!("memory {memory_id}")))?;
        memory.use_count += 1;
        memory.updated_at = Utc::now();
        Ok(memory.clone())
    }

    async fn memory_vector_top_k(
        &self,
        query_vec: &[f32],
        k: usize,
        kind_filter: Option<MemoryKind>,
    ) -> Result<Vec<(Memory, f32)>> {
        let state = self.state.lock().await;
        let mut scored: Vec<(Memory, f32)> = state
            .memories
            .values()
            .filter(|m| kind_filter.map_or(true, |kf| kf == m.kind))
            .map(|m| (m.clone(), cosine(query_vec, &m.embedding_vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then(a.0.memory_id.cmp(&b.0.memory_id)));
        scored.truncate(k);
        Ok(scored)
    }

    async fn memory_browse(&self, k: usize, kind_filter: Option<MemoryKind>) -> Result<Vec<Memory>> {
        let state = self.state.lock().await;
        let mut memories: Vec<Memory> = state
            .memories
            .values()
            .filter(|m| kind_filter.map_or(true, |kf| kf == m.kind))
            .cloned()
            .collect();
        memories.sort_by(|a, b| b.use_count.cmp(&a.use_count).then(b.updated_at.cmp(&a.updated_at)));
        memories.truncate(k);
        Ok(memories)
    }

    async fn memory_mark_used(&self, memory_ids: &[String]) -> Result<()> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        for id in memory_ids {
            if let Some(m) = state.memories.get_mut(id) {
                m.use_count += 1;
                m.last_used_at = Some(now);
            }
        }
        Ok(())
    }

    async fn memory_stats(&self) -> Result<MemoryStats> {
        let state = self.state.lock().await;
        let mut by_kind: HashMap<String, i64> = HashMap::new();
        for m in state.memories.values() {
            *by_kind.entry(m.kind.as_str().to_string()).or_insert(0) += 1;
        }
        let mut by_kind: Vec<(String, i64)> = by_kind.into_iter().collect();
        by_kind.sort();

        let mut most_used: Vec<Memory> = state.memories.values().cloned().collect();
        most_used.sort_by(|a, b| b.use_count.cmp(&a.use_count).then(b.updated_at.cmp(&a.updated_at)));
        most_used.truncate(3);

        Ok(MemoryStats {
            total: state.memories.len() as i64,
            by_kind,
            most_used,
        })
    }

    async fn memory_delete(&self, memory_id: &str) -> Result<bool> {
        Ok(self.state.lock().await.memories.remove(memory_id).is_some())
    }

    async fn patient_timeline(&self, patient_id: &str) -> Result<Vec<TimelineEvent>> {
        let state = self.state.lock().await;
        let mut events: Vec<TimelineEvent> = state
            .documents
            .values()
            .filter(|d| d.patient_id == patient_id)
            .map(|d| TimelineEvent {
                timestamp: d.created_at,
                document_id: d.document_id.clone(),
                document_type: d.document_type.clone(),
            })
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}

/// Deterministic fake embedding client: hashes each input string into a
/// fixed-dimension unit vector, so identical text always embeds identically
/// and distinct text embeds distinctly (no network call).
pub struct FakeEmbeddingClient {
    dimension: usize,
}

impl FakeEmbeddingClient {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one_sync(&self, input: &str) -> Vec<f32> {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(input.as_bytes());
        let mut vec: Vec<f32> = (0..self.dimension)
            .map(|i| {
                let byte = digest[i % digest.len()];
                (byte as f32 / 255.0) + 0.01
            })
            .collect();
        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for v in &mut vec {
                *v /= magnitude;
            }
        }
        vec
    }
}

#[async_trait]
impl EmbeddingClient for FakeEmbeddingClient {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, inputs: &[String], _deadline: &Deadline) -> Result<Vec<Vec<f32>>> {
        Ok(inputs.iter().map(|s| self.embed_one_sync(s)).collect())
    }
}
