//! Error taxonomy shared by every component (§7).
//!
//! Components never invent their own error types; they return `CoreError`
//! (or a `Result<T>` alias of it) so the Tool Server can translate a single
//! enum into `{ok:false, error:{kind,message}}` without lossy wrapping.

use std::fmt;

/// The complete error taxonomy from spec §7.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed request or argument out of bounds.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Referenced id absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transient DB failure, surfaced after the retry policy is exhausted.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Tables missing or shape mismatch; caller must run `ensure_schema`.
    #[error("schema error: {0} (run ensure_schema to remediate)")]
    SchemaError(String),

    /// Upstream embedder failure after retries.
    #[error("embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// A returned embedding vector had zero magnitude.
    #[error("mock embedding detected (zero magnitude), refusing to write: {0}")]
    MockEmbedding(String),

    /// The caller's deadline was reached.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// One or more sub-services failed but others succeeded.
    #[error("partial result: {0}")]
    PartialResult(String),

    /// Sync detected a concurrent update.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Stable, language-agnostic error kind tag for the Tool Server's response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    StoreUnavailable,
    SchemaError,
    EmbeddingUnavailable,
    MockEmbedding,
    DeadlineExceeded,
    PartialResult,
    Conflict,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::StoreUnavailable => "StoreUnavailable",
            ErrorKind::SchemaError => "SchemaError",
            ErrorKind::EmbeddingUnavailable => "EmbeddingUnavailable",
            ErrorKind::MockEmbedding => "MockEmbedding",
            ErrorKind::DeadlineExceeded => "DeadlineExceeded",
            ErrorKind::PartialResult => "PartialResult",
            ErrorKind::Conflict => "Conflict",
        };
        write!(f, "{s}")
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            CoreError::SchemaError(_) => ErrorKind::SchemaError,
            CoreError::EmbeddingUnavailable(_) => ErrorKind::EmbeddingUnavailable,
            CoreError::MockEmbedding(_) => ErrorKind::MockEmbedding,
            CoreError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            CoreError::PartialResult(_) => ErrorKind::PartialResult,
            CoreError::Conflict(_) => ErrorKind::Conflict,
        }
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                CoreError::StoreUnavailable(e.to_string())
            }
            _ => CoreError::StoreUnavailable(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
