//! Error types for MCP tool-server operations.

use thiserror::Error;

/// Error type for MCP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A tool call referenced an unknown method or malformed params.
    #[error("Tool error: {0}")]
    Tool(String),

    /// IO error reading/writing the JSON-RPC transport.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error, typically wrapping a `memory_core::Error`.
    #[error("{0}")]
    General(String),
}

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<memory_core::Error> for Error {
    fn from(err: memory_core::Error) -> Self {
        Error::General(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::General(err.to_string())
    }
}
