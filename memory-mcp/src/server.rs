//! [`MemoryMcpServer`]: dispatches JSON-RPC tool calls onto a
//! [`UnifiedMemorySystem`].

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use memory_core::orchestrator::RecallRequest;
use memory_core::types::{Role, Turn};
use memory_core::UnifiedMemorySystem;

use crate::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

/// Tool server wrapping a [`UnifiedMemorySystem`]. Stateless beyond the
/// system handle: every call is independent, matching the JSON-RPC
/// request/response model.
pub struct MemoryMcpServer {
    system: Arc<UnifiedMemorySystem>,
}

#[derive(Debug, Deserialize)]
struct StoreTurnParams {
    session_id: String,
    turn_id: u64,
    role: RoleParam,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RoleParam {
    User,
    Assistant,
    System,
}

impl From<RoleParam> for Role {
    fn from(role: RoleParam) -> Self {
        match role {
            RoleParam::User => Role::User,
            RoleParam::Assistant => Role::Assistant,
            RoleParam::System => Role::System,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct QueryContextParams {
    session_id: String,
    #[serde(default)]
    turn_limit: Option<usize>,
    #[serde(default)]
    fact_limit: Option<usize>,
    #[serde(default)]
    query_embedding: Option<Vec<f32>>,
    #[serde(default = "default_topk")]
    episode_topk: usize,
    #[serde(default)]
    query_text: Option<String>,
    #[serde(default = "default_topk")]
    knowledge_limit: usize,
}

fn default_topk() -> usize {
    5
}

impl MemoryMcpServer {
    /// Build a server over an already-wired memory system.
    #[must_use]
    pub fn new(system: Arc<UnifiedMemorySystem>) -> Self {
        Self { system }
    }

    /// Names of the tools this server exposes, for a client's
    /// tool-discovery call.
    #[must_use]
    pub fn tool_names() -> &'static [&'static str] {
        &["store_turn", "query_context", "health"]
    }

    /// Dispatch one JSON-RPC request and produce its response. Never
    /// panics: tool/param errors become a JSON-RPC error object, not a
    /// process failure.
    pub async fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        let result = self.dispatch(&request.method, request.params).await;
        match result {
            Ok(value) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            },
            Err(err) => {
                warn!(method = %request.method, error = %err, "tool call failed");
                JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id,
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32000,
                        message: err.to_string(),
                        data: None,
                    }),
                }
            }
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> crate::Result<Value> {
        match method {
            "store_turn" => self.store_turn(params).await,
            "query_context" => self.query_context(params).await,
            "health" => self.health().await,
            other => Err(crate::Error::Tool(format!("unknown tool: {other}"))),
        }
    }

    async fn store_turn(&self, params: Option<Value>) -> crate::Result<Value> {
        let params: StoreTurnParams = serde_json::from_value(
            params.ok_or_else(|| crate::Error::Tool("store_turn requires params".into()))?,
        )?;
        let turn =
            Turn::new(params.session_id.clone(), params.turn_id, params.role.into(), params.content);
        self.system.ingest_turn(turn).await?;
        info!(session_id = %params.session_id, turn_id = params.turn_id, "stored turn");
        Ok(json!({ "session_id": params.session_id, "turn_id": params.turn_id }))
    }

    async fn query_context(&self, params: Option<Value>) -> crate::Result<Value> {
        let params: QueryContextParams = match params {
            Some(value) => serde_json::from_value(value)?,
            None => return Err(crate::Error::Tool("query_context requires params".into())),
        };

        let request = RecallRequest {
            session_id: params.session_id,
            turn_limit: params.turn_limit,
            fact_limit: params.fact_limit,
            query_embedding: params.query_embedding,
            episode_topk: params.episode_topk,
            query_text: params.query_text,
            knowledge_limit: params.knowledge_limit,
        };
        let result = self.system.recall(&request).await;
        Ok(json!({
            "turns": result.turns,
            "facts": result.facts,
            "episodes": result.episodes,
            "knowledge": result.knowledge,
        }))
    }

    async fn health(&self) -> crate::Result<Value> {
        let report = self.system.health_check().await;
        Ok(json!({
            "healthy": report.is_healthy(),
            "llm_circuit": format!("{:?}", report.llm_circuit),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::orchestrator::StorageAdapters;
    use memory_core::types::MemoryConfig;
    use test_utils::{
        InMemoryFullTextStore, InMemoryGraphStore, InMemoryHotStore, InMemoryRelationalStore,
        InMemoryVectorStore, MockLlmClient,
    };

    fn server() -> MemoryMcpServer {
        let system = UnifiedMemorySystem::new(
            StorageAdapters {
                hot: Arc::new(InMemoryHotStore::new()),
                durable: Arc::new(InMemoryRelationalStore::new()),
                vectors: Arc::new(InMemoryVectorStore::new()),
                graph: Arc::new(InMemoryGraphStore::new()),
                fulltext: Arc::new(InMemoryFullTextStore::new()),
            },
            Arc::new(MockLlmClient::default()),
            MemoryConfig::default(),
        );
        MemoryMcpServer::new(Arc::new(system))
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            id: Some(json!(1)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    #[tokio::test]
    async fn store_turn_then_query_context_roundtrips() {
        let server = server();
        let store = server
            .handle(request(
                "store_turn",
                json!({"session_id": "s1", "turn_id": 0, "role": "user", "content": "hi"}),
            ))
            .await;
        assert!(store.error.is_none());

        let query = server.handle(request("query_context", json!({"session_id": "s1"}))).await;
        assert!(query.error.is_none());
        let turns = query.result.unwrap()["turns"].as_array().unwrap().len();
        assert_eq!(turns, 1);
    }

    #[tokio::test]
    async fn health_reports_healthy_in_memory_stack() {
        let server = server();
        let response = server.handle(request("health", json!({}))).await;
        assert_eq!(response.result.unwrap()["healthy"], json!(true));
    }

    #[tokio::test]
    async fn unknown_tool_produces_jsonrpc_error() {
        let server = server();
        let response = server.handle(request("delete_everything", json!({}))).await;
        assert!(response.error.is_some());
    }
}
