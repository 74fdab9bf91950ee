//! `viz_entity_histogram` — `{by}` -> `{labels[], counts[]}`.

use medretrieve_core::error::{CoreError, Result};
use medretrieve_core::viz::HistogramBy;
use serde::Deserialize;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {"by": {"type": "string", "enum": ["type", "kind"]}},
        "required": ["by"]
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    by: String,
}

pub async fn execute(ctx: &ServerContext, arguments: serde_json::Value) -> Result<serde_json::Value> {
    let args: Args = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    let by = match args.by.as_str() {
        "type" => HistogramBy::Type,
        "kind" => HistogramBy::Kind,
        other => return Err(CoreError::InvalidInput(format!("unknown histogram dimension: {other}"))),
    };
    let histogram = ctx.viz.entity_histogram(by).await?;
    Ok(serde_json::json!({ "labels": histogram.labels, "counts": histogram.counts }))
}
