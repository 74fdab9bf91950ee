//! `remember` — `{kind, text, metadata?}` -> `{memory_id}`.

use medretrieve_core::cancellation::Deadline;
use medretrieve_core::domain::MemoryKind;
use medretrieve_core::error::{CoreError, Result};
use serde::Deserialize;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "kind": {"type": "string", "enum": ["correction", "knowledge", "preference", "feedback"]},
            "text": {"type": "string"},
            "metadata": {"type": "object"}
        },
        "required": ["kind", "text"]
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    kind: String,
    text: String,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

pub async fn execute(
    ctx: &ServerContext,
    arguments: serde_json::Value,
    deadline: &Deadline,
) -> Result<serde_json::Value> {
    let args: Args = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    if args.text.trim().is_empty() {
        return Err(CoreError::InvalidInput("text must not be empty".to_string()));
    }
    let kind = MemoryKind::parse(&args.kind)
        .ok_or_else(|| CoreError::InvalidInput(format!("unknown memory kind: {}", args.kind)))?;

    let memory_id = ctx
        .memory
        .remember(kind, &args.text, args.metadata.unwrap_or_default(), deadline)
        .await?;

    Ok(serde_json::json!({ "memory_id": memory_id }))
}
