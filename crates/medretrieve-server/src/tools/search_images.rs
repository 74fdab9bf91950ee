//! `search_images` — `{query or image_ref, top_k, filters?}` -> ranked images with refs.

use medretrieve_core::cancellation::Deadline;
use medretrieve_core::domain::SearchFilter;
use medretrieve_core::error::{CoreError, Result};
use medretrieve_core::search::ImageQuery;
use serde::Deserialize;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {"type": "string"},
            "image_ref": {"type": "string", "description": "base64-encoded image bytes"},
            "top_k": {"type": "integer", "default": 10, "minimum": 1},
            "patient_id": {"type": "string"}
        }
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    image_ref: Option<String>,
    #[serde(default)]
    top_k: Option<usize>,
    #[serde(default)]
    patient_id: Option<String>,
}

pub async fn execute(
    ctx: &ServerContext,
    arguments: serde_json::Value,
    deadline: &Deadline,
) -> Result<serde_json::Value> {
    let args: Args = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

    let query = match (args.query, args.image_ref) {
        (Some(text), _) if !text.trim().is_empty() => ImageQuery::Text(text),
        (_, Some(b64)) => {
            use base64::Engine;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(b64)
                .map_err(|e| CoreError::InvalidInput(format!("invalid image_ref: {e}")))?;
            ImageQuery::Bytes(bytes)
        }
        _ => return Err(CoreError::InvalidInput("one of query or image_ref is required".to_string())),
    };

    let top_k = args
        .top_k
        .unwrap_or(ctx.config.search.default_top_k)
        .min(ctx.config.search.max_top_k);
    let filter = SearchFilter {
        patient_id: args.patient_id,
        document_type: None,
    };

    let ranked = ctx
        .vector_image
        .search_query(query, top_k, &filter, deadline)
        .await?;

    let images: Vec<serde_json::Value> = ranked
        .into_iter()
        .map(|item| serde_json::json!({"image_id": item.id, "score": item.score, "rank": item.rank}))
        .collect();

    Ok(serde_json::json!({ "images": images }))
}
