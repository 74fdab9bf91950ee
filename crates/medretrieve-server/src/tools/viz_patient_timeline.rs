//! `viz_patient_timeline` — `{patient_id}` -> `{events[]}`.

use medretrieve_core::error::{CoreError, Result};
use serde::Deserialize;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {"patient_id": {"type": "string"}},
        "required": ["patient_id"]
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    patient_id: String,
}

pub async fn execute(ctx: &ServerContext, arguments: serde_json::Value) -> Result<serde_json::Value> {
    let args: Args = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    let events = ctx.viz.patient_timeline(&args.patient_id).await?;
    Ok(serde_json::json!({
        "events": events.iter().map(|e| serde_json::json!({
            "timestamp": e.timestamp.to_rfc3339(),
            "document_id": e.document_id,
            "document_type": e.document_type,
        })).collect::<Vec<_>>(),
    }))
}
