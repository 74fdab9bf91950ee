//! Request/response envelope types (§4.8).

use medretrieve_core::ErrorKind;
use serde::{Deserialize, Serialize};

/// `{ tool_name, arguments: map, request_id, deadline? }`
#[derive(Debug, Clone, Deserialize)]
pub struct ToolRequest {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
    pub request_id: String,
    /// Milliseconds from receipt; `None` means no deadline.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

/// `{ request_id, ok, result?, error?, context?, warnings? }`
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub request_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
    /// Auto-Recall Middleware's recalled memories (§4.9), attached to every
    /// search-family response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    /// Present alongside a degraded-but-usable result (§7 `PartialResult`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
    pub tool_name: String,
    pub request_id: String,
}

impl ToolResponse {
    pub fn success(request_id: String, result: serde_json::Value) -> Self {
        Self {
            request_id,
            ok: true,
            result: Some(result),
            error: None,
            context: None,
            warnings: None,
        }
    }

    pub fn partial(request_id: String, result: serde_json::Value, warnings: Vec<String>) -> Self {
        Self {
            request_id,
            ok: true,
            result: Some(result),
            error: None,
            context: None,
            warnings: Some(warnings),
        }
    }

    pub fn failure(request_id: String, tool_name: &str, error: &medretrieve_core::CoreError) -> Self {
        Self {
            request_id: request_id.clone(),
            ok: false,
            result: None,
            error: Some(ErrorPayload {
                kind: error.kind(),
                message: error.to_string(),
                tool_name: tool_name.to_string(),
                request_id,
            }),
            context: None,
            warnings: None,
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}
