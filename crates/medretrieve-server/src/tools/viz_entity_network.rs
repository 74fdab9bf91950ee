//! `viz_entity_network` — `{seed_entity_ids[], depth}` -> `{nodes[], edges[]}`.

use medretrieve_core::error::{CoreError, Result};
use serde::Deserialize;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "seed_entity_ids": {"type": "array", "items": {"type": "integer"}},
            "depth": {"type": "integer", "enum": [1, 2, 3], "default": 1}
        },
        "required": ["seed_entity_ids"]
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    seed_entity_ids: Vec<i64>,
    #[serde(default = "default_depth")]
    depth: u8,
}

fn default_depth() -> u8 {
    1
}

pub async fn execute(ctx: &ServerContext, arguments: serde_json::Value) -> Result<serde_json::Value> {
    let args: Args = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    let network = ctx.viz.entity_network(&args.seed_entity_ids, args.depth).await?;
    Ok(serde_json::json!({
        "nodes": network.nodes,
        "edges": network.edges,
    }))
}
