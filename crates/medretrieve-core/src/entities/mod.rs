//! Entity Extractor (C3): regex-based candidate extraction from decoded
//! clinical note text, plus CO_OCCURS_WITH edge generation.
//!
//! Deliberately dependency-free beyond `regex` — no LLM call, no external
//! service, so extraction is fully deterministic and offline (§4.3,
//! "Determinism"). The directed relationship kinds (TREATS, CAUSES,
//! LOCATED_IN, PRECEDES) are modeled in the data layer but this extractor
//! never emits them; see DESIGN.md for the reasoning.

mod patterns;

use chrono::Utc;

use crate::domain::{Entity, EntityType, Relationship, RelationshipKind};

/// A candidate entity before it has been assigned a surrogate id by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub entity_type: EntityType,
    pub confidence: f32,
    pub span: (usize, usize),
}

pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract deduplicated candidates and their CO_OCCURS_WITH edges from
    /// one document's decoded text. Deterministic: identical input and
    /// pattern set always produce bit-identical output (§4.3).
    pub fn extract(&self, document_id: &str, text: &str) -> (Vec<Entity>, Vec<Relationship>) {
        let mut candidates = patterns::match_all(text);
        dedup_overlapping_spans(&mut candidates);
        candidates.sort_by_key(|c| c.span.0);

        let now = Utc::now();
        let entities: Vec<Entity> = candidates
            .iter()
            .map(|c| Entity {
                entity_id: 0,
                text: c.text.clone(),
                entity_type: c.entity_type,
                confidence: c.confidence,
                source_document_id: document_id.to_string(),
                embedding_vector: None,
                created_at: now,
            })
            .collect();

        let mut relationships = Vec::new();
        for i in 0..entities.len() {
            for j in (i + 1)..entities.len() {
                relationships.push(
                    Relationship {
                        relationship_id: 0,
                        source_entity_id: i as i64,
                        target_entity_id: j as i64,
                        kind: RelationshipKind::CoOccursWith,
                        confidence: entities[i].confidence.min(entities[j].confidence),
                        source_document_id: document_id.to_string(),
                    }
                    .canonicalize(),
                );
            }
        }

        (entities, relationships)
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Deduplicate spans that overlap: higher confidence wins, then longer span,
/// then earlier start (§4.3 step 3). Two spans overlap if their character
/// ranges intersect.
fn dedup_overlapping_spans(candidates: &mut Vec<Candidate>) {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap()
            .then((b.span.1 - b.span.0).cmp(&(a.span.1 - a.span.0)))
            .then(a.span.0.cmp(&b.span.0))
    });

    let mut kept: Vec<Candidate> = Vec::new();
    'candidate: for c in candidates.drain(..) {
        for k in &kept {
            if spans_overlap(c.span, k.span) {
                continue 'candidate;
            }
        }
        kept.push(c);
    }
    kept.sort_by_key(|c| c.span.0);
    *candidates = kept;
}

fn spans_overlap(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_is_deterministic() {
        let extractor = EntityExtractor::new();
        let text = "Patient reports chest pain and shortness of breath after taking aspirin.";
        let (e1, r1) = extractor.extract("doc-1", text);
        let (e2, r2) = extractor.extract("doc-1", text);
        assert_eq!(e1.len(), e2.len());
        for (a, b) in e1.iter().zip(e2.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.entity_type, b.entity_type);
            assert_eq!(a.confidence, b.confidence);
        }
        assert_eq!(r1.len(), r2.len());
    }

    #[test]
    fn co_occurs_with_is_emitted_for_every_pair() {
        let extractor = EntityExtractor::new();
        let (entities, relationships) =
            extractor.extract("doc-2", "chest pain and fever and aspirin");
        let n = entities.len();
        if n >= 2 {
            assert_eq!(relationships.len(), n * (n - 1) / 2);
            assert!(relationships.iter().all(|r| r.kind == RelationshipKind::CoOccursWith));
        }
    }

    #[test]
    fn overlapping_spans_keep_higher_confidence() {
        let mut candidates = vec![
            Candidate {
                text: "chest pain".to_string(),
                entity_type: EntityType::Symptom,
                confidence: 0.7,
                span: (0, 10),
            },
            Candidate {
                text: "pain".to_string(),
                entity_type: EntityType::Symptom,
                confidence: 0.9,
                span: (6, 10),
            },
        ];
        dedup_overlapping_spans(&mut candidates);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "pain");
    }
}
