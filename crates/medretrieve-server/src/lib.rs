//! Tool Server (C8) and Auto-Recall Middleware (C9): the agent-facing
//! binary's shared logic, split out as a library so `medretrieve-server`
//! (the tool RPC listener) and `medretrieve-sync` (the scheduler-driven
//! batch runner) can both depend on it.

pub mod context;
pub mod protocol;
pub mod server;
pub mod tools;

pub use context::ServerContext;
pub use server::ToolServer;
