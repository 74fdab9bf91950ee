//! Tool RPC protocol (§6): length-prefixed JSON frames over a stream,
//! carrying the request/response envelopes of §4.8.

pub mod framing;
pub mod types;

pub use framing::FramedTransport;
pub use types::{ErrorPayload, ToolRequest, ToolResponse};
