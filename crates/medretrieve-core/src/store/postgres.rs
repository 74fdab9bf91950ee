//! Postgres + pgvector implementation of the Store Adapter (C1).
//!
//! Vectors are bound as typed `pgvector::Vector` parameters — never via
//! string interpolation — and compared with pgvector's `<=>` cosine-distance
//! operator. `ensure_schema` is idempotent SQL (`CREATE TABLE IF NOT
//! EXISTS` / `CREATE INDEX IF NOT EXISTS`), mirroring the migration style of
//! the engine this crate is descended from, but collapsed into one
//! bootstrap script since there is exactly one schema version to manage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::{HashSet, VecDeque};

use crate::domain::{
    Document, Entity, EntityType, GraphStats, Image, Memory, MemoryKind, Relationship,
    RelationshipKind, SearchFilter,
};
use crate::error::{CoreError, Result};

use super::{
    DocumentTimestamp, EntityDocumentMatch, MemoryStats, Store, TimelineEvent, VectorTable,
};

pub struct PgStore {
    pool: PgPool,
    dimension: usize,
}

impl PgStore {
    /// Connect with a pool sized per `store.pool_size` (spec §6).
    pub async fn connect(dsn: &str, pool_size: u32, dimension: usize) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(dsn)
            .await
            .map_err(|e| CoreError::StoreUnavailable(e.to_string()))?;
        Ok(Self { pool, dimension })
    }

    fn check_dimension(&self, vec: &[f32]) -> Result<()> {
        if vec.len() != self.dimension {
            return Err(CoreError::InvalidInput(format!(
                "expected embedding dimension {}, got {}",
                self.dimension,
                vec.len()
            )));
        }
        Ok(())
    }

    fn sql_error(e: sqlx::Error) -> CoreError {
        CoreError::StoreUnavailable(e.to_string())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::SchemaError(e.to_string()))?;
        Ok(())
    }

    async fn insert_document(&self, doc: &Document) -> Result<()> {
        self.check_dimension(&doc.embedding_vector)?;
        sqlx::query(
            "INSERT INTO documents
                (document_id, patient_id, document_type, decoded_text, source_ref,
                 embedding, embedding_model_tag, created_at, source_last_modified)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&doc.document_id)
        .bind(&doc.patient_id)
        .bind(&doc.document_type)
        .bind(&doc.decoded_text)
        .bind(&doc.source_ref)
        .bind(Vector::from(doc.embedding_vector.clone()))
        .bind(&doc.embedding_model_tag)
        .bind(doc.created_at)
        .bind(doc.source_last_modified)
        .execute(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn upsert_document(&self, doc: &Document) -> Result<()> {
        self.check_dimension(&doc.embedding_vector)?;
        sqlx::query(
            "INSERT INTO documents
                (document_id, patient_id, document_type, decoded_text, source_ref,
                 embedding, embedding_model_tag, created_at, source_last_modified)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (document_id) DO UPDATE SET
                patient_id = EXCLUDED.patient_id,
                document_type = EXCLUDED.document_type,
                decoded_text = EXCLUDED.decoded_text,
                source_ref = EXCLUDED.source_ref,
                embedding = EXCLUDED.embedding,
                embedding_model_tag = EXCLUDED.embedding_model_tag,
                source_last_modified = EXCLUDED.source_last_modified",
        )
        .bind(&doc.document_id)
        .bind(&doc.patient_id)
        .bind(&doc.document_type)
        .bind(&doc.decoded_text)
        .bind(&doc.source_ref)
        .bind(Vector::from(doc.embedding_vector.clone()))
        .bind(&doc.embedding_model_tag)
        .bind(doc.created_at)
        .bind(doc.source_last_modified)
        .execute(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT document_id, patient_id, document_type, decoded_text, source_ref,
                    embedding, embedding_model_tag, created_at, source_last_modified
             FROM documents WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::sql_error)?;

        Ok(match row {
            Some(row) => Some(document_from_row(&row)?),
            None => None,
        })
    }

    async fn insert_image(&self, image: &Image) -> Result<()> {
        self.check_dimension(&image.embedding_vector)?;
        sqlx::query(
            "INSERT INTO images
                (image_id, patient_id, study_id, view_position, storage_ref,
                 embedding, related_document_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (image_id) DO UPDATE SET
                patient_id = EXCLUDED.patient_id,
                study_id = EXCLUDED.study_id,
                view_position = EXCLUDED.view_position,
                storage_ref = EXCLUDED.storage_ref,
                embedding = EXCLUDED.embedding,
                related_document_id = EXCLUDED.related_document_id",
        )
        .bind(&image.image_id)
        .bind(&image.patient_id)
        .bind(&image.study_id)
        .bind(&image.view_position)
        .bind(&image.storage_ref)
        .bind(Vector::from(image.embedding_vector.clone()))
        .bind(&image.related_document_id)
        .execute(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn vector_top_k(
        &self,
        table: VectorTable,
        query_vec: &[f32],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<(String, f32)>> {
        self.check_dimension(query_vec)?;
        let vector = Vector::from(query_vec.to_vec());

        let (table_name, id_col, patient_col, type_col) = match table {
            VectorTable::Documents => ("documents", "document_id", "patient_id", "document_type"),
            VectorTable::Images => ("images", "image_id", "patient_id", "view_position"),
        };

        let mut sql = format!(
            "SELECT {id_col} AS id, 1.0 - (embedding <=> $1) AS score
             FROM {table_name} WHERE 1=1"
        );
        let mut bind_idx = 2;
        if filter.patient_id.is_some() {
            sql.push_str(&format!(" AND {patient_col} = ${bind_idx}"));
            bind_idx += 1;
        }
        if filter.document_type.is_some() && matches!(table, VectorTable::Documents) {
            sql.push_str(&format!(" AND {type_col} = ${bind_idx}"));
        }
        sql.push_str(&format!(" ORDER BY score DESC, {id_col} ASC LIMIT {k}"));

        let mut query = sqlx::query(&sql).bind(vector);
        if let Some(p) = &filter.patient_id {
            query = query.bind(p);
        }
        if let Some(t) = &filter.document_type {
            if matches!(table, VectorTable::Documents) {
                query = query.bind(t);
            }
        }

        let rows = query.fetch_all(&self.pool).await.map_err(Self::sql_error)?;
        Ok(rows
            .into_iter()
            // pgvector's `<=>` operator yields `double precision`; normalize
            // to f32 here so callers never see the store's native width (§4.7
            // invariant, generalized to every cosine score this adapter returns).
            .map(|r| (r.get::<String, _>("id"), r.get::<f64, _>("score") as f32))
            .collect())
    }

    async fn keyword_top_k(
        &self,
        terms: &[String],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<(String, i64)>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        // Overlap = count of lowercased terms present in decoded_text. This
        // MUST run against decoded_text, never a raw/hex source column — the
        // regression the source once shipped (spec §4.5, §8).
        let mut sql = String::from(
            "SELECT document_id,
                    (SELECT count(*) FROM unnest($1::text[]) t
                     WHERE lower(decoded_text) LIKE '%' || t || '%') AS overlap
             FROM documents WHERE 1=1",
        );
        let mut bind_idx = 2;
        if filter.patient_id.is_some() {
            sql.push_str(&format!(" AND patient_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if filter.document_type.is_some() {
            sql.push_str(&format!(" AND document_type = ${bind_idx}"));
        }
        sql.push_str(" ORDER BY overlap DESC, document_id ASC");

        let mut query = sqlx::query(&sql).bind(terms);
        if let Some(p) = &filter.patient_id {
            query = query.bind(p);
        }
        if let Some(t) = &filter.document_type {
            query = query.bind(t);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(Self::sql_error)?;
        Ok(rows
            .into_iter()
            .map(|r| (r.get::<String, _>("document_id"), r.get::<i64, _>("overlap")))
            .filter(|(_, overlap)| *overlap > 0)
            .take(k)
            .collect())
    }

    async fn entities_by_text(&self, substrings: &[String], limit: usize) -> Result<Vec<Entity>> {
        if substrings.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            "SELECT entity_id, text, entity_type, confidence, source_document_id, created_at
             FROM entities
             WHERE EXISTS (
                SELECT 1 FROM unnest($1::text[]) t WHERE lower(text) LIKE '%' || lower(t) || '%'
             )
             ORDER BY entity_id ASC LIMIT $2",
        )
        .bind(substrings)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        rows.iter().map(entity_from_row).collect()
    }

    async fn entities_neighbors(
        &self,
        entity_id: i64,
        depth: u8,
        limit: usize,
    ) -> Result<(Vec<Entity>, Vec<Relationship>)> {
        if !(1..=3).contains(&depth) {
            return Err(CoreError::InvalidInput(
                "depth must be 1, 2 or 3".to_string(),
            ));
        }

        let seed = self.entity_by_id(entity_id).await?;
        let Some(seed) = seed else {
            return Ok((Vec::new(), Vec::new()));
        };

        let mut visited: HashSet<i64> = HashSet::from([entity_id]);
        let mut frontier: VecDeque<(i64, u8)> = VecDeque::from([(entity_id, 0)]);
        let mut nodes = vec![seed];
        let mut edges: Vec<Relationship> = Vec::new();
        let mut edge_ids: HashSet<i64> = HashSet::new();

        while let Some((current, hop)) = frontier.pop_front() {
            if hop >= depth {
                continue;
            }
            let rows = sqlx::query(
                "SELECT relationship_id, source_entity_id, target_entity_id, kind, confidence, source_document_id
                 FROM relationships
                 WHERE source_entity_id = $1 OR target_entity_id = $1
                 ORDER BY relationship_id ASC",
            )
            .bind(current)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::sql_error)?;

            for row in &rows {
                let rel = relationship_from_row(row)?;
                if edge_ids.insert(rel.relationship_id) {
                    edges.push(rel.clone());
                }
                let neighbor = if rel.source_entity_id == current {
                    rel.target_entity_id
                } else {
                    rel.source_entity_id
                };
                if visited.insert(neighbor) {
                    if let Some(entity) = self.entity_by_id(neighbor).await? {
                        nodes.push(entity);
                    }
                    frontier.push_back((neighbor, hop + 1));
                }
                if nodes.len() >= limit {
                    break;
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
        let total: i64 = sqlx::query("SELECT count(*) AS c FROM entities")
            .fetch_one(&self.pool)
            .await
            .map_err(Self::sql_error)?
            .get("c");

        let by_type_rows = sqlx::query(
            "SELECT entity_type, count(*) AS c FROM entities GROUP BY entity_type ORDER BY entity_type",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        let by_type = by_type_rows
            .iter()
            .map(|r| (r.get::<String, _>("entity_type"), r.get::<i64, _>("c")))
            .collect();

        let by_kind_rows = sqlx::query(
            "SELECT kind, count(*) AS c FROM relationships GROUP BY kind ORDER BY kind",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        let by_relationship_kind = by_kind_rows
            .iter()
            .map(|r| (r.get::<String, _>("kind"), r.get::<i64, _>("c")))
            .collect();

        Ok(GraphStats {
            total_entities: total,
            by_type,
            by_relationship_kind,
        })
    }

    async fn documents_mentioning_entities(
        &self,
        entity_ids: &[i64],
        k: usize,
    ) -> Result<Vec<EntityDocumentMatch>> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            "SELECT source_document_id AS document_id,
                    count(DISTINCT entity_id) AS entity_match_count,
                    sum(confidence) AS confidence_sum
             FROM entities
             WHERE entity_id = ANY($1)
             GROUP BY source_document_id
             ORDER BY entity_match_count DESC, confidence_sum DESC, document_id ASC
             LIMIT $2",
        )
        .bind(entity_ids)
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::sql_error)?;

        Ok(rows
            .into_iter()
            .map(|r| EntityDocumentMatch {
                document_id: r.get("document_id"),
                entity_match_count: r.get::<i64, _>("entity_match_count") as usize,
                // SUM(real) promotes to double precision in Postgres.
                confidence_sum: r.get::<f64, _>("confidence_sum") as f32,
            })
            .collect())
    }

    async fn replace_document_entities(
        &self,
        document_id: &str,
        entities: &[Entity],
        relationships: &[Relationship],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Self::sql_error)?;

        sqlx::query("DELETE FROM relationships WHERE source_document_id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(Self::sql_error)?;
        sqlx::query("DELETE FROM entities WHERE source_document_id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(Self::sql_error)?;

        // position in `entities` -> new surrogate id, so relationships can be
        // re-pointed after entities are re-inserted with fresh ids. Keyed by
        // position rather than `entity.entity_id`: candidates from
        // `EntityExtractor::extract` carry `entity_id == 0` for every entity
        // (the id is assigned here, on insert) and its relationships
        // reference entities by their position in this same slice.
        let mut id_map = std::collections::HashMap::new();
        for (position, entity) in entities.iter().enumerate() {
            let row = sqlx::query(
                "INSERT INTO entities (text, entity_type, confidence, source_document_id, embedding, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING entity_id",
            )
            .bind(&entity.text)
            .bind(entity.entity_type.as_str())
            .bind(entity.confidence)
            .bind(document_id)
            .bind(entity.embedding_vector.clone().map(Vector::from))
            .bind(entity.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(Self::sql_error)?;
            id_map.insert(position as i64, row.get::<i64, _>("entity_id"));
        }

        for rel in relationships {
            let source = *id_map.get(&rel.source_entity_id).unwrap_or(&rel.source_entity_id);
            let target = *id_map.get(&rel.target_entity_id).unwrap_or(&rel.target_entity_id);
            let canonical = Relationship {
                relationship_id: 0,
                source_entity_id: source,
                target_entity_id: target,
                kind: rel.kind,
                confidence: rel.confidence,
                source_document_id: document_id.to_string(),
            }
            .canonicalize();

            sqlx::query(
                "INSERT INTO relationships (source_entity_id, target_entity_id, kind, confidence, source_document_id)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(canonical.source_entity_id)
            .bind(canonical.target_entity_id)
            .bind(canonical.kind.as_str())
            .bind(canonical.confidence)
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(Self::sql_error)?;
        }

        tx.commit().await.map_err(Self::sql_error)?;
        Ok(())
    }

    async fn extraction_watermark(&self) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT max(created_at) AS watermark FROM entities")
            .fetch_one(&self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(row.try_get::<Option<DateTime<Utc>>, _>("watermark").unwrap_or(None))
    }

    async fn documents_modified_since(
        &self,
        watermark: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<DocumentTimestamp>> {
        let rows = match watermark {
            Some(wm) => sqlx::query(
                "SELECT document_id, source_last_modified FROM documents
                 WHERE source_last_modified > $1
                 ORDER BY source_last_modified ASC LIMIT $2",
            )
            .bind(wm)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::sql_error)?,
            None => sqlx::query(
                "SELECT document_id, source_last_modified FROM documents
                 ORDER BY source_last_modified ASC LIMIT $1",
            )
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::sql_error)?,
        };

        Ok(rows
            .into_iter()
            .map(|r| DocumentTimestamp {
                document_id: r.get("document_id"),
                source_last_modified: r.get("source_last_modified"),
            })
            .collect())
    }

    async fn memory_find_by_id(&self, memory_id: &str) -> Result<Option<Memory>> {
        let row = sqlx::query(
            "SELECT memory_id, kind, text, embedding, metadata, use_count, created_at, updated_at, last_used_at
             FROM memories WHERE memory_id = $1",
        )
        .bind(memory_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        row.as_ref().map(memory_from_row).transpose()
    }

    async fn memory_insert(&self, memory: &Memory) -> Result<()> {
        sqlx::query(
            "INSERT INTO memories
                (memory_id, kind, text, embedding, metadata, use_count, created_at, updated_at, last_used_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&memory.memory_id)
        .bind(memory.kind.as_str())
        .bind(&memory.text)
        .bind(Vector::from(memory.embedding_vector.clone()))
        .bind(&memory.metadata)
        .bind(memory.use_count)
        .bind(memory.created_at)
        .bind(memory.updated_at)
        .bind(memory.last_used_at)
        .execute(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn memory_touch(&self, memory_id: &str) -> Result<Memory> {
        let row = sqlx::query(
            "UPDATE memories SET use_count = use_count + 1, updated_at = now()
             WHERE memory_id = $1
             RETURNING memory_id, kind, text, embedding, metadata, use_count, created_at, updated_at, last_used_at",
        )
        .bind(memory_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        match row {
            Some(r) => memory_from_row(&r),
            None => Err(CoreError::NotFound(format!("memory {memory_id}"))),
        }
    }

    async fn memory_vector_top_k(
        &self,
        query_vec: &[f32],
        k: usize,
        kind_filter: Option<MemoryKind>,
    ) -> Result<Vec<(Memory, f32)>> {
        self.check_dimension(query_vec)?;
        let vector = Vector::from(query_vec.to_vec());
        let rows = if let Some(kind) = kind_filter {
            sqlx::query(
                "SELECT memory_id, kind, text, embedding, metadata, use_count, created_at, updated_at, last_used_at,
                        1.0 - (embedding <=> $1) AS similarity
                 FROM memories WHERE kind = $2
                 ORDER BY similarity DESC, memory_id ASC LIMIT $3",
            )
            .bind(vector)
            .bind(kind.as_str())
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::sql_error)?
        } else {
            sqlx::query(
                "SELECT memory_id, kind, text, embedding, metadata, use_count, created_at, updated_at, last_used_at,
                        1.0 - (embedding <=> $1) AS similarity
                 FROM memories
                 ORDER BY similarity DESC, memory_id ASC LIMIT $2",
            )
            .bind(vector)
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::sql_error)?
        };

        rows.iter()
            .map(|r| Ok((memory_from_row(r)?, r.get::<f64, _>("similarity") as f32)))
            .collect()
    }

    async fn memory_browse(&self, k: usize, kind_filter: Option<MemoryKind>) -> Result<Vec<Memory>> {
        let rows = if let Some(kind) = kind_filter {
            sqlx::query(
                "SELECT memory_id, kind, text, embedding, metadata, use_count, created_at, updated_at, last_used_at
                 FROM memories WHERE kind = $1
                 ORDER BY use_count DESC, updated_at DESC LIMIT $2",
            )
            .bind(kind.as_str())
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::sql_error)?
        } else {
            sqlx::query(
                "SELECT memory_id, kind, text, embedding, metadata, use_count, created_at, updated_at, last_used_at
                 FROM memories
                 ORDER BY use_count DESC, updated_at DESC LIMIT $1",
            )
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::sql_error)?
        };
        rows.iter().map(memory_from_row).collect()
    }

    async fn memory_mark_used(&self, memory_ids: &[String]) -> Result<()> {
        if memory_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "UPDATE memories SET use_count = use_count + 1, last_used_at = now()
             WHERE memory_id = ANY($1)",
        )
        .bind(memory_ids)
        .execute(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn memory_stats(&self) -> Result<MemoryStats> {
        let total: i64 = sqlx::query("SELECT count(*) AS c FROM memories")
            .fetch_one(&self.pool)
            .await
            .map_err(Self::sql_error)?
            .get("c");

        let by_kind_rows = sqlx::query("SELECT kind, count(*) AS c FROM memories GROUP BY kind ORDER BY kind")
            .fetch_all(&self.pool)
            .await
            .map_err(Self::sql_error)?;
        let by_kind = by_kind_rows
            .into_iter()
            .map(|r| (r.get::<String, _>("kind"), r.get::<i64, _>("c")))
            .collect();

        let most_used_rows = sqlx::query(
            "SELECT memory_id, kind, text, embedding, metadata, use_count, created_at, updated_at, last_used_at
             FROM memories ORDER BY use_count DESC, updated_at DESC LIMIT 3",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        let most_used = most_used_rows.iter().map(memory_from_row).collect::<Result<Vec<_>>>()?;

        Ok(MemoryStats {
            total,
            by_kind,
            most_used,
        })
    }

    async fn memory_delete(&self, memory_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM memories WHERE memory_id = $1")
            .bind(memory_id)
            .execute(&self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn patient_timeline(&self, patient_id: &str) -> Result<Vec<TimelineEvent>> {
        let rows = sqlx::query(
            "SELECT created_at, document_id, document_type FROM documents
             WHERE patient_id = $1 ORDER BY created_at ASC",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        Ok(rows
            .into_iter()
            .map(|r| TimelineEvent {
                timestamp: r.get("created_at"),
                document_id: r.get("document_id"),
                document_type: r.get("document_type"),
            })
            .collect())
    }
}

impl PgStore {
    async fn entity_by_id(&self, entity_id: i64) -> Result<Option<Entity>> {
        let row = sqlx::query(
            "SELECT entity_id, text, entity_type, confidence, source_document_id, created_at
             FROM entities WHERE entity_id = $1",
        )
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::sql_error)?;
        row.as_ref().map(entity_from_row).transpose()
    }
}

fn document_from_row(row: &sqlx::postgres::PgRow) -> Result<Document> {
    let embedding: Vector = row.get("embedding");
    Ok(Document {
        document_id: row.get("document_id"),
        patient_id: row.get("patient_id"),
        document_type: row.get("document_type"),
        decoded_text: row.get("decoded_text"),
        source_ref: row.get("source_ref"),
        embedding_vector: embedding.to_vec(),
        embedding_model_tag: row.get("embedding_model_tag"),
        created_at: row.get("created_at"),
        source_last_modified: row.get("source_last_modified"),
    })
}

fn entity_from_row(row: &sqlx::postgres::PgRow) -> Result<Entity> {
    let type_str: String = row.get("entity_type");
    let entity_type = EntityType::parse(&type_str)
        .ok_or_else(|| CoreError::SchemaError(format!("unknown entity_type {type_str}")))?;
    Ok(Entity {
        entity_id: row.get("entity_id"),
        text: row.get("text"),
        entity_type,
        confidence: row.get("confidence"),
        source_document_id: row.get("source_document_id"),
        embedding_vector: None,
        created_at: row.get("created_at"),
    })
}

fn relationship_from_row(row: &sqlx::postgres::PgRow) -> Result<Relationship> {
    let kind_str: String = row.get("kind");
    let kind = RelationshipKind::parse(&kind_str)
        .ok_or_else(|| CoreError::SchemaError(format!("unknown relationship kind {kind_str}")))?;
    Ok(Relationship {
        relationship_id: row.get("relationship_id"),
        source_entity_id: row.get("source_entity_id"),
        target_entity_id: row.get("target_entity_id"),
        kind,
        confidence: row.get("confidence"),
        source_document_id: row.get("source_document_id"),
    })
}

fn memory_from_row(row: &sqlx::postgres::PgRow) -> Result<Memory> {
    let kind_str: String = row.get("kind");
    let kind = MemoryKind::parse(&kind_str)
        .ok_or_else(|| CoreError::SchemaError(format!("unknown memory kind {kind_str}")))?;
    let embedding: Vector = row.get("embedding");
    Ok(Memory {
        memory_id: row.get("memory_id"),
        kind,
        text: row.get("text"),
        embedding_vector: embedding.to_vec(),
        metadata: row.get("metadata"),
        use_count: row.get("use_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        last_used_at: row.get("last_used_at"),
    })
}

/// Idempotent bootstrap schema (§4.1, §6). Vector columns are left
/// dimension-unconstrained (`vector` rather than `vector(D)`) since pgvector
/// requires a literal at table-creation time and this schema is shared
/// across deployments with different configured `embedding.dimension`
/// values; `check_dimension` enforces D at the application boundary instead.
const SCHEMA_SQL: &str = r#"
CREATE EXTENSION IF NOT EXISTS vector;

CREATE TABLE IF NOT EXISTS documents (
    document_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    document_type TEXT NOT NULL,
    decoded_text TEXT NOT NULL,
    source_ref TEXT NOT NULL,
    embedding vector NOT NULL,
    embedding_model_tag TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    source_last_modified TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_documents_patient ON documents (patient_id);
CREATE INDEX IF NOT EXISTS idx_documents_type ON documents (document_type);
CREATE INDEX IF NOT EXISTS idx_documents_modified ON documents (source_last_modified);

CREATE TABLE IF NOT EXISTS images (
    image_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    study_id TEXT NOT NULL,
    view_position TEXT NOT NULL,
    storage_ref TEXT NOT NULL,
    embedding vector NOT NULL,
    related_document_id TEXT REFERENCES documents(document_id)
);
CREATE INDEX IF NOT EXISTS idx_images_patient ON images (patient_id);

CREATE TABLE IF NOT EXISTS entities (
    entity_id BIGSERIAL PRIMARY KEY,
    text TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    confidence REAL NOT NULL,
    source_document_id TEXT NOT NULL REFERENCES documents(document_id) ON DELETE CASCADE,
    embedding vector,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (source_document_id, text, entity_type)
);
CREATE INDEX IF NOT EXISTS idx_entities_document ON entities (source_document_id);
CREATE INDEX IF NOT EXISTS idx_entities_type ON entities (entity_type);
CREATE INDEX IF NOT EXISTS idx_entities_created ON entities (created_at);

CREATE TABLE IF NOT EXISTS relationships (
    relationship_id BIGSERIAL PRIMARY KEY,
    source_entity_id BIGINT NOT NULL REFERENCES entities(entity_id) ON DELETE CASCADE,
    target_entity_id BIGINT NOT NULL REFERENCES entities(entity_id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    confidence REAL NOT NULL,
    source_document_id TEXT NOT NULL REFERENCES documents(document_id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_relationships_document ON relationships (source_document_id);
CREATE INDEX IF NOT EXISTS idx_relationships_kind ON relationships (kind);
CREATE INDEX IF NOT EXISTS idx_relationships_source ON relationships (source_entity_id);
CREATE INDEX IF NOT EXISTS idx_relationships_target ON relationships (target_entity_id);

CREATE TABLE IF NOT EXISTS memories (
    memory_id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    text TEXT NOT NULL,
    embedding vector NOT NULL,
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
    use_count BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    last_used_at TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS idx_memories_kind ON memories (kind);
CREATE INDEX IF NOT EXISTS idx_memories_use_count ON memories (use_count);
"#;
