//! `search_documents` — `{query, top_k, patient_id?}` -> ranked docs with snippets.

use medretrieve_core::cancellation::Deadline;
use medretrieve_core::domain::SearchFilter;
use medretrieve_core::error::{CoreError, Result};
use medretrieve_core::search::SearchService;
use serde::Deserialize;

use crate::context::ServerContext;

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {"type": "string"},
            "top_k": {"type": "integer", "default": 10, "minimum": 1},
            "patient_id": {"type": "string"}
        },
        "required": ["query"]
    })
}

#[derive(Debug, Deserialize)]
struct Args {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
    #[serde(default)]
    patient_id: Option<String>,
}

const SNIPPET_LEN: usize = 160;

pub async fn execute(
    ctx: &ServerContext,
    arguments: serde_json::Value,
    deadline: &Deadline,
) -> Result<serde_json::Value> {
    let args: Args = serde_json::from_value(arguments)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    if args.query.trim().is_empty() {
        return Err(CoreError::InvalidInput("query must not be empty".to_string()));
    }
    let top_k = args
        .top_k
        .unwrap_or(ctx.config.search.default_top_k)
        .min(ctx.config.search.max_top_k);

    let filter = SearchFilter {
        patient_id: args.patient_id,
        document_type: None,
    };

    let ranked = ctx
        .vector_text
        .search(&args.query, top_k, &filter, deadline)
        .await?;

    let mut docs = Vec::with_capacity(ranked.len());
    for item in &ranked {
        let doc = ctx.store.get_document(&item.id).await?;
        if let Some(doc) = doc {
            let snippet: String = doc.decoded_text.chars().take(SNIPPET_LEN).collect();
            docs.push(serde_json::json!({
                "document_id": doc.document_id,
                "patient_id": doc.patient_id,
                "document_type": doc.document_type,
                "snippet": snippet,
                "score": item.score,
                "rank": item.rank,
            }));
        }
    }

    Ok(serde_json::json!({ "documents": docs }))
}
