//! `memory_stats` — `{}` -> totals and most used.

use medretrieve_core::error::Result;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

pub async fn execute(ctx: &ServerContext) -> Result<serde_json::Value> {
    let stats = ctx.memory.stats().await?;
    Ok(serde_json::json!({
        "total": stats.total,
        "by_kind": stats.by_kind,
        "most_used": stats.most_used.iter().map(|m| serde_json::json!({
            "memory_id": m.memory_id,
            "kind": m.kind.as_str(),
            "text": m.text,
            "use_count": m.use_count,
        })).collect::<Vec<_>>(),
    }))
}
