//! Tool Server (C8): request state machine
//! `Received -> Validated -> Recall-Augmented -> Dispatched -> (Responded | Failed)`,
//! and the Auto-Recall Middleware (C9) that precedes dispatch for
//! search-family requests.

use std::sync::Arc;
use std::time::Duration;

use medretrieve_core::cancellation::Deadline;
use medretrieve_core::CoreError;
use tracing::{info, warn};

use crate::context::ServerContext;
use crate::protocol::types::{ToolRequest, ToolResponse};
use crate::tools;

/// Requests that trigger the Auto-Recall Middleware before dispatch (§4.9).
const SEARCH_FAMILY: &[&str] = &["search_documents", "search_images", "hybrid_search"];

pub struct ToolServer {
    ctx: Arc<ServerContext>,
}

impl ToolServer {
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Self { ctx }
    }

    pub async fn handle_request(&self, request: ToolRequest) -> ToolResponse {
        let deadline = match request.deadline_ms {
            Some(ms) => Deadline::after(Duration::from_millis(ms)),
            None => Deadline::none(),
        };

        // Validated: arguments are validated per-tool inside dispatch, since
        // each tool's shape differs; a malformed `tool_name` is the one
        // universal validation failure.
        if !tools::is_known_tool(&request.tool_name) {
            let error = CoreError::InvalidInput(format!("unknown tool: {}", request.tool_name));
            return ToolResponse::failure(request.request_id, &request.tool_name, &error);
        }

        let context_payload = if SEARCH_FAMILY.contains(&request.tool_name.as_str()) {
            self.auto_recall(&request, &deadline).await
        } else {
            None
        };

        let dispatch_result =
            tools::dispatch(&self.ctx, &request.tool_name, request.arguments.clone(), &deadline).await;

        let mut response = match dispatch_result {
            Ok(mut result) => {
                // A tool signals a degraded-but-usable result by embedding a
                // top-level `warnings` array (§7 PartialResult); promote it
                // into the envelope and strip it from `result`.
                let warnings = result
                    .as_object_mut()
                    .and_then(|obj| obj.remove("warnings"))
                    .and_then(|w| serde_json::from_value::<Vec<String>>(w).ok());

                match warnings {
                    Some(warnings) if !warnings.is_empty() => {
                        warn!(tool = %request.tool_name, request_id = %request.request_id, ?warnings, "partial result");
                        ToolResponse::partial(request.request_id.clone(), result, warnings)
                    }
                    _ => {
                        info!(tool = %request.tool_name, request_id = %request.request_id, "tool dispatch succeeded");
                        ToolResponse::success(request.request_id.clone(), result)
                    }
                }
            }
            Err(e) => {
                warn!(tool = %request.tool_name, request_id = %request.request_id, error = %e, "tool dispatch failed");
                ToolResponse::failure(request.request_id.clone(), &request.tool_name, &e)
            }
        };

        if let Some(context_payload) = context_payload {
            response = response.with_context(context_payload);
        }

        response
    }

    /// Recall the top-3 memories for the query before dispatch. Failures
    /// never fail the request — swallowed and logged (§4.9).
    async fn auto_recall(&self, request: &ToolRequest, deadline: &Deadline) -> Option<serde_json::Value> {
        let query = request
            .arguments
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        match self.ctx.memory.recall(query, 3, None, None, deadline).await {
            Ok(memories) => {
                info!(
                    request_id = %request.request_id,
                    recalled = memories.len(),
                    "auto-recall attached to response context"
                );
                Some(serde_json::json!(memories
                    .into_iter()
                    .map(|(m, similarity)| serde_json::json!({
                        "memory_id": m.memory_id,
                        "kind": m.kind.as_str(),
                        "text": m.text,
                        "similarity": similarity,
                    }))
                    .collect::<Vec<_>>()))
            }
            Err(e) => {
                warn!(request_id = %request.request_id, error = %e, "auto-recall failed, continuing without context");
                None
            }
        }
    }
}
