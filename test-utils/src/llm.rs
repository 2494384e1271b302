//! Test doubles for [`LlmClient`].

use async_trait::async_trait;
use memory_core::llm::{GenerationRequest, GenerationResponse, LlmClient};
use memory_core::{Error, Result};

/// Echoes the prompt back as plain text, embeds to a fixed-dimension
/// zero-ish vector. Good enough for call sites that only need *a*
/// response, not a specific one.
pub struct MockLlmClient {
    embedding_dim: usize,
}

impl MockLlmClient {
    /// Build a client with an 8-dimensional embedding output.
    #[must_use]
    pub fn new() -> Self {
        Self { embedding_dim: 8 }
    }

    /// Build a client embedding to `dim` dimensions.
    #[must_use]
    pub fn with_embedding_dim(dim: usize) -> Self {
        Self { embedding_dim: dim }
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        Ok(GenerationResponse::Text(request.prompt))
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.1; self.embedding_dim])
    }
}

/// Fails every call, for exercising circuit-breaker and heuristic
/// fallback paths.
#[derive(Default)]
pub struct FailingLlm;

#[async_trait]
impl LlmClient for FailingLlm {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse> {
        Err(Error::TransientBackendError("mock llm failure".into()))
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::TransientBackendError("mock llm failure".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_echoes_prompt() {
        let client = MockLlmClient::new();
        let response = client.generate(GenerationRequest::text("hello")).await.unwrap();
        assert_eq!(response.as_text(), "hello");
    }

    #[tokio::test]
    async fn failing_llm_errors_on_generate_and_embed() {
        let client = FailingLlm;
        assert!(client.generate(GenerationRequest::text("hi")).await.is_err());
        assert!(client.embed("hi").await.is_err());
    }
}
