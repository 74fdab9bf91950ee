//! Data model (spec §3): Document, Image, Entity, Relationship, Memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A decoded clinical document with a text embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub patient_id: String,
    pub document_type: String,
    pub decoded_text: String,
    pub source_ref: String,
    pub embedding_vector: Vec<f32>,
    pub embedding_model_tag: String,
    pub created_at: DateTime<Utc>,
    /// Timestamp of the source bundle this document was decoded from. The
    /// Sync Engine's watermark (§4.4) advances across this field, not
    /// `created_at`, so re-ingesting an unchanged document never re-triggers
    /// extraction.
    pub source_last_modified: DateTime<Utc>,
}

/// A medical image with an embedding in the same (or a joint) space as documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub image_id: String,
    pub patient_id: String,
    pub study_id: String,
    pub view_position: String,
    pub storage_ref: String,
    pub embedding_vector: Vec<f32>,
    pub related_document_id: Option<String>,
}

/// Entity types recognized by the extractor (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Symptom,
    Condition,
    Medication,
    Procedure,
    BodyPart,
    Temporal,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Symptom => "SYMPTOM",
            EntityType::Condition => "CONDITION",
            EntityType::Medication => "MEDICATION",
            EntityType::Procedure => "PROCEDURE",
            EntityType::BodyPart => "BODY_PART",
            EntityType::Temporal => "TEMPORAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SYMPTOM" => Some(EntityType::Symptom),
            "CONDITION" => Some(EntityType::Condition),
            "MEDICATION" => Some(EntityType::Medication),
            "PROCEDURE" => Some(EntityType::Procedure),
            "BODY_PART" => Some(EntityType::BodyPart),
            "TEMPORAL" => Some(EntityType::Temporal),
            _ => None,
        }
    }
}

/// A node in the knowledge graph, extracted from one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Surrogate id, assigned by the store on insert (0 before insertion).
    pub entity_id: i64,
    pub text: String,
    pub entity_type: EntityType,
    pub confidence: f32,
    pub source_document_id: String,
    pub embedding_vector: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

/// Relationship kinds (spec §3). Only `CoOccursWith` is currently produced by
/// the regex extractor (see DESIGN.md Open Question resolution); the directed
/// kinds are reserved for a future LLM-based extractor and are fully modeled
/// end to end (storage, graph queries) even though nothing emits them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    CoOccursWith,
    Treats,
    Causes,
    LocatedIn,
    Precedes,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::CoOccursWith => "CO_OCCURS_WITH",
            RelationshipKind::Treats => "TREATS",
            RelationshipKind::Causes => "CAUSES",
            RelationshipKind::LocatedIn => "LOCATED_IN",
            RelationshipKind::Precedes => "PRECEDES",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CO_OCCURS_WITH" => Some(RelationshipKind::CoOccursWith),
            "TREATS" => Some(RelationshipKind::Treats),
            "CAUSES" => Some(RelationshipKind::Causes),
            "LOCATED_IN" => Some(RelationshipKind::LocatedIn),
            "PRECEDES" => Some(RelationshipKind::Precedes),
            _ => None,
        }
    }

    /// CO_OCCURS_WITH is undirected and canonicalized by `(min_id, max_id)`;
    /// the rest are directed source -> target.
    pub fn is_undirected(&self) -> bool {
        matches!(self, RelationshipKind::CoOccursWith)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub relationship_id: i64,
    pub source_entity_id: i64,
    pub target_entity_id: i64,
    pub kind: RelationshipKind,
    pub confidence: f32,
    pub source_document_id: String,
}

impl Relationship {
    /// Canonicalize an undirected edge's endpoint order: `(min_id, max_id)`.
    pub fn canonicalize(mut self) -> Self {
        if self.kind.is_undirected() && self.source_entity_id > self.target_entity_id {
            std::mem::swap(&mut self.source_entity_id, &mut self.target_entity_id);
        }
        self
    }
}

/// Semantic memory kinds (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Correction,
    Knowledge,
    Preference,
    Feedback,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Correction => "correction",
            MemoryKind::Knowledge => "knowledge",
            MemoryKind::Preference => "preference",
            MemoryKind::Feedback => "feedback",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "correction" => Some(MemoryKind::Correction),
            "knowledge" => Some(MemoryKind::Knowledge),
            "preference" => Some(MemoryKind::Preference),
            "feedback" => Some(MemoryKind::Feedback),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Content hash of `(kind, text)`, hex-encoded.
    pub memory_id: String,
    pub kind: MemoryKind,
    pub text: String,
    pub embedding_vector: Vec<f32>,
    pub metadata: serde_json::Value,
    pub use_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// A filter restricting a search to one patient and/or document type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    pub patient_id: Option<String>,
    pub document_type: Option<String>,
}

/// Totals by type/kind, used by `graph_stats` and the histogram builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_entities: i64,
    pub by_type: Vec<(String, i64)>,
    pub by_relationship_kind: Vec<(String, i64)>,
}
