//! `delete_memory` — `{memory_id}` -> `{ok}`.

use medretrieve_core::error::{CoreError, Result};
use serde::Deserialize;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {"memory_id": {"type": "string"}},
        "required": ["memory_id"]
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    memory_id: String,
}

pub async fn execute(ctx: &ServerContext, arguments: serde_json::Value) -> Result<serde_json::Value> {
    let args: Args = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    let deleted = ctx.memory.delete(&args.memory_id).await?;
    Ok(serde_json::json!({ "ok": deleted }))
}
