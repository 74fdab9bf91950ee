//! Visualization Builders (C10): pure transforms from stored data into
//! chart payloads. No plotting — these only shape data (§4.10).

use std::sync::Arc;

use serde::Serialize;

use crate::domain::GraphStats;
use crate::error::Result;
use crate::store::{Store, TimelineEvent};

#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub labels: Vec<String>,
    pub counts: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramBy {
    Type,
    Kind,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkNode {
    pub id: i64,
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkEdge {
    pub src: i64,
    pub dst: i64,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityNetwork {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

pub struct VizBuilder {
    store: Arc<dyn Store>,
}

impl VizBuilder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn entity_histogram(&self, by: HistogramBy) -> Result<Histogram> {
        let stats: GraphStats = self.store.graph_stats().await?;
        let pairs = match by {
            HistogramBy::Type => stats.by_type,
            HistogramBy::Kind => stats.by_relationship_kind,
        };
        let (labels, counts) = pairs.into_iter().unzip();
        Ok(Histogram { labels, counts })
    }

    pub async fn patient_timeline(&self, patient_id: &str) -> Result<Vec<TimelineEvent>> {
        self.store.patient_timeline(patient_id).await
    }

    /// Deduplicated subgraph rooted at each of `seed_ids`, expanded `depth`
    /// hops (1..=3). Overlapping seed expansions are merged by node/edge id.
    pub async fn entity_network(&self, seed_ids: &[i64], depth: u8) -> Result<EntityNetwork> {
        let mut nodes = std::collections::HashMap::new();
        let mut edges = std::collections::HashMap::new();

        for &seed_id in seed_ids {
            let (found_nodes, found_edges) = self.store.entities_neighbors(seed_id, depth, 1000).await?;
            for entity in found_nodes {
                nodes.entry(entity.entity_id).or_insert(NetworkNode {
                    id: entity.entity_id,
                    text: entity.text,
                    entity_type: entity.entity_type.as_str().to_string(),
                });
            }
            for rel in found_edges {
                edges.entry(rel.relationship_id).or_insert(NetworkEdge {
                    src: rel.source_entity_id,
                    dst: rel.target_entity_id,
                    kind: rel.kind.as_str().to_string(),
                });
            }
        }

        let mut nodes: Vec<NetworkNode> = nodes.into_values().collect();
        nodes.sort_by_key(|n| n.id);
        let mut edges: Vec<NetworkEdge> = edges.into_values().collect();
        edges.sort_by_key(|e| (e.src, e.dst));

        Ok(EntityNetwork { nodes, edges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, EntityType, Relationship, RelationshipKind};
    use crate::testutil::FakeStore;
    use chrono::Utc;

    #[tokio::test]
    async fn histogram_reports_counts_by_type() {
        let store = Arc::new(FakeStore::new());
        store.seed_document("doc-1", "chest pain and fever", Utc::now()).await;
        store
            .replace_document_entities(
                "doc-1",
                &[
                    Entity {
                        entity_id: 0,
                        text: "chest pain".into(),
                        entity_type: EntityType::Symptom,
                        confidence: 0.8,
                        source_document_id: "doc-1".into(),
                        embedding_vector: None,
                        created_at: Utc::now(),
                    },
                    Entity {
                        entity_id: 1,
                        text: "fever".into(),
                        entity_type: EntityType::Symptom,
                        confidence: 0.8,
                        source_document_id: "doc-1".into(),
                        embedding_vector: None,
                        created_at: Utc::now(),
                    },
                ],
                &[],
            )
            .await
            .unwrap();

        let viz = VizBuilder::new(store);
        let histogram = viz.entity_histogram(HistogramBy::Type).await.unwrap();
        assert_eq!(histogram.labels, vec!["SYMPTOM".to_string()]);
        assert_eq!(histogram.counts, vec![2]);
    }

    #[tokio::test]
    async fn network_dedups_shared_nodes_across_seeds() {
        let store = Arc::new(FakeStore::new());
        store.seed_document("doc-1", "a b", Utc::now()).await;
        store
            .replace_document_entities(
                "doc-1",
                &[
                    Entity {
                        entity_id: 0,
                        text: "a".into(),
                        entity_type: EntityType::Symptom,
                        confidence: 0.8,
                        source_document_id: "doc-1".into(),
                        embedding_vector: None,
                        created_at: Utc::now(),
                    },
                    Entity {
                        entity_id: 0,
                        text: "b".into(),
                        entity_type: EntityType::Symptom,
                        confidence: 0.8,
                        source_document_id: "doc-1".into(),
                        embedding_vector: None,
                        created_at: Utc::now(),
                    },
                ],
                &[Relationship {
                    relationship_id: 0,
                    source_entity_id: 0,
                    target_entity_id: 1,
                    kind: RelationshipKind::CoOccursWith,
                    confidence: 0.8,
                    source_document_id: "doc-1".into(),
                }],
            )
            .await
            .unwrap();

        let viz = VizBuilder::new(store);
        let network = viz.entity_network(&[1, 2], 1).await.unwrap();
        assert_eq!(network.nodes.len(), 2);
        assert_eq!(network.edges.len(), 1);
    }
}
