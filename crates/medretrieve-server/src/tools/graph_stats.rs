//! `graph_stats` — `{}` -> totals by type/kind.

use medretrieve_core::error::Result;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

pub async fn execute(ctx: &ServerContext) -> Result<serde_json::Value> {
    let stats = ctx.store.graph_stats().await?;
    Ok(serde_json::json!({
        "total_entities": stats.total_entities,
        "by_type": stats.by_type,
        "by_relationship_kind": stats.by_relationship_kind,
    }))
}
