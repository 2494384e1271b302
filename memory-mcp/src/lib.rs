//! # Memory MCP
//!
//! A minimal JSON-RPC tool server over [`memory_core::UnifiedMemorySystem`]:
//! `store_turn`, `query_context`, and `health`. Speaks line-delimited or
//! LSP `Content-Length`-framed JSON-RPC over stdio, the same framing an
//! editor-embedded MCP client uses to talk to a local tool server.

pub mod error;
pub mod jsonrpc;
pub mod server;

pub use error::{Error, Result};
pub use server::MemoryMcpServer;
