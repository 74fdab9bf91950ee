//! `graph_neighbors` — `{entity_id, depth∈{1,2,3}, limit}` -> subgraph.

use medretrieve_core::error::{CoreError, Result};
use serde::Deserialize;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "entity_id": {"type": "integer"},
            "depth": {"type": "integer", "enum": [1, 2, 3], "default": 1},
            "limit": {"type": "integer", "default": 50, "minimum": 1}
        },
        "required": ["entity_id"]
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    entity_id: i64,
    #[serde(default = "default_depth")]
    depth: u8,
    #[serde(default)]
    limit: Option<usize>,
}

fn default_depth() -> u8 {
    1
}

pub async fn execute(ctx: &ServerContext, arguments: serde_json::Value) -> Result<serde_json::Value> {
    let args: Args = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

    let (nodes, edges) = ctx
        .store
        .entities_neighbors(args.entity_id, args.depth, args.limit.unwrap_or(50))
        .await?;

    Ok(serde_json::json!({
        "nodes": nodes.iter().map(|e| serde_json::json!({
            "id": e.entity_id,
            "text": e.text,
            "type": e.entity_type.as_str(),
        })).collect::<Vec<_>>(),
        "edges": edges.iter().map(|r| serde_json::json!({
            "src": r.source_entity_id,
            "dst": r.target_entity_id,
            "kind": r.kind.as_str(),
        })).collect::<Vec<_>>(),
    }))
}
