//! Core library for the multi-modal medical retrieval engine: the Store
//! Adapter, Embedding Client, Entity Extractor, Sync Engine, Search
//! Services, RRF Fusion, Memory Store, and Visualization Builders.
//!
//! The Tool Server and Auto-Recall Middleware live in the `medretrieve-server`
//! binary crate and depend on this crate through the capability traits
//! (`Store`, `EmbeddingClient`, `SearchService`) so they can be exercised
//! against in-memory fakes (`testutil`) instead of a live Postgres instance
//! or embedding endpoint.

pub mod cancellation;
pub mod config;
pub mod domain;
pub mod embeddings;
pub mod entities;
pub mod error;
pub mod fusion;
pub mod memory;
pub mod search;
pub mod store;
pub mod sync;
pub mod viz;

#[cfg(any(test, feature = "test-support"))]
pub mod testutil;

pub use error::{CoreError, ErrorKind, Result};
