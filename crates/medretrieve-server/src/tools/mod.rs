//! Tool catalog (§4.8): one module per tool, each exposing `schema()` and
//! `execute()`. Adding a tool here is a backward-compatible protocol change;
//! renaming or removing one is breaking.

pub mod delete_memory;
pub mod graph_entity_search;
pub mod graph_neighbors;
pub mod graph_stats;
pub mod hybrid_search;
pub mod memory_stats;
pub mod recall;
pub mod remember;
pub mod search_documents;
pub mod search_images;
pub mod viz_entity_histogram;
pub mod viz_entity_network;
pub mod viz_patient_timeline;

use medretrieve_core::cancellation::Deadline;
use medretrieve_core::error::Result;

use crate::context::ServerContext;

const TOOL_NAMES: &[&str] = &[
    "search_documents",
    "search_images",
    "hybrid_search",
    "graph_entity_search",
    "graph_neighbors",
    "graph_stats",
    "remember",
    "recall",
    "memory_stats",
    "delete_memory",
    "viz_entity_histogram",
    "viz_patient_timeline",
    "viz_entity_network",
];

pub fn is_known_tool(name: &str) -> bool {
    TOOL_NAMES.contains(&name)
}

pub fn tool_names() -> &'static [&'static str] {
    TOOL_NAMES
}

pub async fn dispatch(
    ctx: &ServerContext,
    tool_name: &str,
    arguments: serde_json::Value,
    deadline: &Deadline,
) -> Result<serde_json::Value> {
    match tool_name {
        "search_documents" => search_documents::execute(ctx, arguments, deadline).await,
        "search_images" => search_images::execute(ctx, arguments, deadline).await,
        "hybrid_search" => hybrid_search::execute(ctx, arguments, deadline).await,
        "graph_entity_search" => graph_entity_search::execute(ctx, arguments, deadline).await,
        "graph_neighbors" => graph_neighbors::execute(ctx, arguments).await,
        "graph_stats" => graph_stats::execute(ctx).await,
        "remember" => remember::execute(ctx, arguments, deadline).await,
        "recall" => recall::execute(ctx, arguments, deadline).await,
        "memory_stats" => memory_stats::execute(ctx).await,
        "delete_memory" => delete_memory::execute(ctx, arguments).await,
        "viz_entity_histogram" => viz_entity_histogram::execute(ctx, arguments).await,
        "viz_patient_timeline" => viz_patient_timeline::execute(ctx, arguments).await,
        "viz_entity_network" => viz_entity_network::execute(ctx, arguments).await,
        other => Err(medretrieve_core::CoreError::InvalidInput(format!(
            "unknown tool: {other}"
        ))),
    }
}
