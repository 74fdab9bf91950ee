//! `hybrid_search` — `{query, top_k, use:{text,image,graph}}` -> fused ranked
//! list with per-source scores. Fans out to the selected services
//! concurrently and joins before fusion (§4.8 dispatch concurrency).

use medretrieve_core::cancellation::Deadline;
use medretrieve_core::domain::SearchFilter;
use medretrieve_core::error::{CoreError, Result};
use medretrieve_core::fusion::{reciprocal_rank_fusion, RankedList as FusionList};
use medretrieve_core::search::{ImageQuery, SearchService};
use serde::Deserialize;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {"type": "string"},
            "top_k": {"type": "integer", "default": 10, "minimum": 1},
            "use": {
                "type": "object",
                "properties": {
                    "text": {"type": "boolean", "default": true},
                    "image": {"type": "boolean", "default": false},
                    "graph": {"type": "boolean", "default": false}
                }
            },
            "patient_id": {"type": "string"}
        },
        "required": ["query"]
    })
}

#[derive(Debug, Default, Deserialize)]
struct UseFlags {
    #[serde(default = "default_true")]
    text: bool,
    #[serde(default)]
    image: bool,
    #[serde(default)]
    graph: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct Args {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
    #[serde(default)]
    r#use: UseFlags,
    #[serde(default)]
    patient_id: Option<String>,
}

pub async fn execute(
    ctx: &ServerContext,
    arguments: serde_json::Value,
    deadline: &Deadline,
) -> Result<serde_json::Value> {
    let args: Args = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    if args.query.trim().is_empty() {
        return Err(CoreError::InvalidInput("query must not be empty".to_string()));
    }
    let top_k = args
        .top_k
        .unwrap_or(ctx.config.search.default_top_k)
        .min(ctx.config.search.max_top_k);
    let filter = SearchFilter {
        patient_id: args.patient_id,
        document_type: None,
    };

    let (text_res, image_res, graph_res) = tokio::join!(
        async {
            if args.r#use.text {
                Some(ctx.vector_text.search(&args.query, top_k, &filter, deadline).await)
            } else {
                None
            }
        },
        async {
            if args.r#use.image {
                Some(
                    ctx.vector_image
                        .search_query(ImageQuery::Text(args.query.clone()), top_k, &filter, deadline)
                        .await,
                )
            } else {
                None
            }
        },
        async {
            if args.r#use.graph {
                Some(ctx.graph.search(&args.query, top_k, &filter, deadline).await)
            } else {
                None
            }
        },
    );

    let mut warnings = Vec::new();
    let mut lists: Vec<FusionList> = Vec::new();
    let mut per_source = serde_json::Map::new();

    for (name, result) in [("text", text_res), ("image", image_res), ("graph", graph_res)] {
        if let Some(result) = result {
            match result {
                Ok(ranked) => {
                    per_source.insert(
                        name.to_string(),
                        serde_json::json!(ranked
                            .iter()
                            .map(|r| serde_json::json!({"id": r.id, "rank": r.rank, "score": r.score}))
                            .collect::<Vec<_>>()),
                    );
                    lists.push(ranked.into_iter().map(|r| r.id).collect());
                }
                Err(e) => {
                    // A failed sub-service contributes nothing to fusion;
                    // the composite search still returns partial results
                    // (§4.5 cancellation & timeouts, §7 PartialResult).
                    warnings.push(format!("{name} search failed: {e}"));
                }
            }
        }
    }

    let fused = reciprocal_rank_fusion(&lists, ctx.config.rrf.k, top_k);
    let mut result = serde_json::json!({
        "results": fused.iter().map(|e| serde_json::json!({
            "id": e.id,
            "score": e.score,
            "lists_containing": e.lists_containing,
        })).collect::<Vec<_>>(),
        "per_source": per_source,
    });

    // A sub-service failure degrades rather than fails the composite search
    // (§4.5 partial-success mode); the Tool Server promotes this field into
    // the response envelope's top-level `warnings` (§7 PartialResult).
    if !warnings.is_empty() {
        result["warnings"] = serde_json::json!(warnings);
    }

    Ok(result)
}
