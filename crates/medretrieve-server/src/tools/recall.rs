//! `recall` — `{query, k, kind?}` -> memory list + similarities.

use medretrieve_core::cancellation::Deadline;
use medretrieve_core::domain::MemoryKind;
use medretrieve_core::error::{CoreError, Result};
use serde::Deserialize;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {"type": "string"},
            "k": {"type": "integer", "default": 10, "minimum": 1},
            "kind": {"type": "string", "enum": ["correction", "knowledge", "preference", "feedback"]},
            "min_similarity": {"type": "number"}
        },
        "required": ["query"]
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    query: String,
    #[serde(default)]
    k: Option<usize>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    min_similarity: Option<f32>,
}

pub async fn execute(
    ctx: &ServerContext,
    arguments: serde_json::Value,
    deadline: &Deadline,
) -> Result<serde_json::Value> {
    let args: Args = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

    let kind_filter = match args.kind {
        Some(ref s) => {
            Some(MemoryKind::parse(s).ok_or_else(|| CoreError::InvalidInput(format!("unknown memory kind: {s}")))?)
        }
        None => None,
    };

    let memories = ctx
        .memory
        .recall(&args.query, args.k.unwrap_or(10), kind_filter, args.min_similarity, deadline)
        .await?;

    Ok(serde_json::json!({
        "memories": memories.into_iter().map(|(m, similarity)| serde_json::json!({
            "memory_id": m.memory_id,
            "kind": m.kind.as_str(),
            "text": m.text,
            "use_count": m.use_count,
            "similarity": similarity,
        })).collect::<Vec<_>>(),
    }))
}
