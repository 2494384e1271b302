//! LLM client contract (§6), consumed by `TopicSegmenter`, `FactExtractor`,
//! `ConsolidationEngine`, and `DistillationEngine`.
//!
//! Implementations are external collaborators — out of scope for this
//! crate — but every caller here is written against the
//! [`LlmClient`] trait and an injected `Arc<dyn LlmClient>`, so a real
//! provider (OpenAI, a local model server, etc.) drops in without
//! touching tier or engine code. Callers always go through the shared
//! [`CircuitBreaker`](crate::storage::circuit_breaker::CircuitBreaker)
//! rather than calling the client directly.

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

/// A single structured-generation request: a prompt plus an optional
/// JSON schema the response must conform to.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Prompt text sent to the model.
    pub prompt: String,
    /// When present, the client should request/validate a response
    /// conforming to this JSON schema (provider-dependent enforcement).
    pub response_schema: Option<Value>,
}

impl GenerationRequest {
    /// Build a plain-text request with no schema constraint.
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
        }
    }

    /// Build a request expecting a structured JSON response.
    #[must_use]
    pub fn structured(prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: Some(schema),
        }
    }
}

/// A generation response: either free text or a structured JSON value,
/// depending on whether the request carried a `response_schema`.
#[derive(Debug, Clone)]
pub enum GenerationResponse {
    /// Plain model output.
    Text(String),
    /// Output validated/parsed against the requested schema.
    Structured(Value),
}

impl GenerationResponse {
    /// Borrow the text payload, or the structured payload serialized
    /// to a string, whichever is present.
    #[must_use]
    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        match self {
            GenerationResponse::Text(s) => std::borrow::Cow::Borrowed(s),
            GenerationResponse::Structured(v) => std::borrow::Cow::Owned(v.to_string()),
        }
    }
}

/// Language-model client contract. Must be asynchronous and
/// cancel-safe at request boundaries — dropping an in-flight future
/// must not leave server-side or client-side state inconsistent.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate text or structured output for a single request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TransientBackendError`] for retryable
    /// provider failures (rate limits, timeouts) and
    /// [`crate::Error::ValidationError`] if a structured response
    /// fails schema validation.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;

    /// Embed text into a fixed-dimension vector for L3 episode
    /// vectorization.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TransientBackendError`] for retryable
    /// provider failures.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
