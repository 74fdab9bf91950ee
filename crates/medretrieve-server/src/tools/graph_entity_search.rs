//! `graph_entity_search` — `{text, type?, limit}` -> matching entities with confidences.

use medretrieve_core::cancellation::Deadline;
use medretrieve_core::domain::EntityType;
use medretrieve_core::error::{CoreError, Result};
use serde::Deserialize;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "text": {"type": "string"},
            "type": {"type": "string", "enum": ["SYMPTOM", "CONDITION", "MEDICATION", "PROCEDURE", "BODY_PART", "TEMPORAL"]},
            "limit": {"type": "integer", "default": 20, "minimum": 1}
        },
        "required": ["text"]
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    text: String,
    #[serde(default, rename = "type")]
    entity_type: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

pub async fn execute(
    ctx: &ServerContext,
    arguments: serde_json::Value,
    deadline: &Deadline,
) -> Result<serde_json::Value> {
    let args: Args = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

    let wanted_type = match args.entity_type {
        Some(ref s) => Some(
            EntityType::parse(s).ok_or_else(|| CoreError::InvalidInput(format!("unknown entity type: {s}")))?,
        ),
        None => None,
    };

    let limit = args.limit.unwrap_or(20);
    let terms = vec![args.text.clone()];
    let entities = deadline.race(ctx.store.entities_by_text(&terms, limit)).await?;

    let filtered: Vec<serde_json::Value> = entities
        .into_iter()
        .filter(|e| wanted_type.map_or(true, |t| t == e.entity_type))
        .map(|e| {
            serde_json::json!({
                "entity_id": e.entity_id,
                "text": e.text,
                "type": e.entity_type.as_str(),
                "confidence": e.confidence,
                "source_document_id": e.source_document_id,
            })
        })
        .collect();

    Ok(serde_json::json!({ "entities": filtered }))
}
