//! MCP server binary.
//!
//! Speaks JSON-RPC over stdio (line-delimited or LSP `Content-Length`
//! framed, see [`memory_mcp::jsonrpc`]) and dispatches `store_turn`,
//! `query_context`, and `health` onto a [`memory_core::UnifiedMemorySystem`].

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use memory_core::orchestrator::StorageAdapters;
use memory_core::types::MemoryConfig;
use memory_core::UnifiedMemorySystem;
use memory_mcp::jsonrpc::{read_next_message, write_response_with_length, JsonRpcRequest};
use memory_mcp::MemoryMcpServer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let system = Arc::new(build_system().await?);
    system.start_engines();
    let server = MemoryMcpServer::new(system.clone());

    info!(tools = ?MemoryMcpServer::tool_names(), "memory-mcp-server ready on stdio");

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    loop {
        let message = match read_next_message(&mut reader) {
            Ok(Some((msg, _content_length_framed))) => msg,
            Ok(None) => break,
            Err(err) => {
                error!(%err, "failed reading stdin");
                break;
            }
        };

        let request: JsonRpcRequest = match serde_json::from_str(&message) {
            Ok(req) => req,
            Err(err) => {
                error!(%err, "malformed JSON-RPC request");
                continue;
            }
        };

        let response = server.handle(request).await;
        let body = serde_json::to_string(&response)?;
        write_response_with_length(&mut writer, &body)?;
    }

    system.stop_engines().await;
    Ok(())
}

/// Build the memory system from environment-configured backends, falling
/// back to in-memory doubles for any adapter without a compiled-in feature.
async fn build_system() -> anyhow::Result<UnifiedMemorySystem> {
    let adapters = build_adapters().await?;
    let llm = Arc::new(test_utils::MockLlmClient::default());
    Ok(UnifiedMemorySystem::new(adapters, llm, MemoryConfig::from_env()))
}

async fn build_adapters() -> anyhow::Result<StorageAdapters> {
    use test_utils::{InMemoryFullTextStore, InMemoryGraphStore, InMemoryVectorStore};

    let hot = hot_store().await?;
    let durable = relational_store().await?;

    Ok(StorageAdapters {
        hot,
        durable,
        vectors: Arc::new(InMemoryVectorStore::new()),
        graph: Arc::new(InMemoryGraphStore::new()),
        fulltext: Arc::new(InMemoryFullTextStore::new()),
    })
}

#[cfg(feature = "redb")]
async fn hot_store() -> anyhow::Result<Arc<dyn memory_core::storage::HotStore>> {
    let path = std::env::var("MEMORY_MCP_REDB_PATH").unwrap_or_else(|_| "memory.redb".to_string());
    let store = memory_storage_redb::RedbHotStore::new(std::path::Path::new(&path)).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redb"))]
async fn hot_store() -> anyhow::Result<Arc<dyn memory_core::storage::HotStore>> {
    Ok(Arc::new(test_utils::InMemoryHotStore::new()))
}

#[cfg(feature = "turso")]
async fn relational_store() -> anyhow::Result<Arc<dyn memory_core::storage::RelationalStore>> {
    if let Ok(url) = std::env::var("MEMORY_MCP_TURSO_URL") {
        let token = std::env::var("MEMORY_MCP_TURSO_TOKEN").unwrap_or_default();
        let store = memory_storage_turso::TursoRelationalStore::connect(&url, &token).await?;
        return Ok(Arc::new(store));
    }
    Ok(Arc::new(test_utils::InMemoryRelationalStore::new()))
}

#[cfg(not(feature = "turso"))]
async fn relational_store() -> anyhow::Result<Arc<dyn memory_core::storage::RelationalStore>> {
    Ok(Arc::new(test_utils::InMemoryRelationalStore::new()))
}
