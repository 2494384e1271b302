//! Batch compression of L1 turns into `TopicSegment`s (§4.6, ADR-003 §4).
//!
//! One LLM call per batch, never per turn: `PromotionEngine` hands a
//! window of turns to [`TopicSegmenter::segment`], which prompts once
//! and parses the response into a handful of segments rather than
//! summarizing each turn individually.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::constants::segmentation;
use crate::llm::{GenerationRequest, GenerationResponse, LlmClient};
use crate::storage::circuit_breaker::CircuitBreaker;
use crate::types::{Role, TopicSegment, Turn};
use crate::Result;

#[derive(Debug, Deserialize)]
struct RawSegment {
    topic: String,
    summary: String,
    key_points: Vec<String>,
    turn_indices: Vec<usize>,
    certainty: f32,
    impact: f32,
    participant_count: usize,
    message_count: usize,
    temporal_context: String,
}

#[derive(Debug, Deserialize)]
struct RawSegmentBatch {
    segments: Vec<RawSegment>,
}

/// Converts L1 turn batches into topic segments via a single LLM call,
/// with a deterministic fallback when the call fails or returns
/// unparseable JSON.
pub struct TopicSegmenter {
    llm: Arc<dyn LlmClient>,
    breaker: Arc<CircuitBreaker>,
}

impl TopicSegmenter {
    /// Build a segmenter around a shared LLM client and circuit
    /// breaker.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmClient>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { llm, breaker }
    }

    /// Segment a batch of turns.
    ///
    /// Returns `[]` if `turns.len() < batch_min_turns` (engine skips
    /// this cycle); truncates to the most recent `batch_max_turns` if
    /// the batch is larger. Falls back to a single low-confidence
    /// segment covering the whole (possibly truncated) batch if the
    /// LLM call fails or its response doesn't parse/validate.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::Error::CircuitOpen`] only if the caller
    /// needs to distinguish breaker-open from other failures; in
    /// practice this method never returns an error — all failure
    /// modes degrade to the fallback segment per §4.6.
    pub async fn segment(&self, turns: &[Turn]) -> Result<Vec<TopicSegment>> {
        if turns.len() < segmentation::BATCH_MIN_TURNS {
            debug!(count = turns.len(), "batch below minimum, skipping cycle");
            return Ok(Vec::new());
        }

        let window: Vec<&Turn> = if turns.len() > segmentation::BATCH_MAX_TURNS {
            turns[turns.len() - segmentation::BATCH_MAX_TURNS..].iter().collect()
        } else {
            turns.iter().collect()
        };
        let turn_indices: Vec<usize> = (0..window.len()).collect();

        let prompt = Self::build_prompt(&window);
        let request = GenerationRequest::structured(prompt, Self::schema());

        let llm = self.llm.clone();
        let response = self.breaker.call(|| async move { llm.generate(request).await }).await;

        match response {
            Ok(resp) => match Self::parse_and_validate(&resp) {
                Ok(segments) if !segments.is_empty() => Ok(segments),
                Ok(_) => {
                    warn!("segmenter returned zero valid segments, using fallback");
                    Ok(vec![Self::fallback(&window, &turn_indices)])
                }
                Err(e) => {
                    warn!(error = %e, "segmenter response failed validation, using fallback");
                    Ok(vec![Self::fallback(&window, &turn_indices)])
                }
            },
            Err(e) => {
                warn!(error = %e, "segmenter LLM call failed, using fallback");
                Ok(vec![Self::fallback(&window, &turn_indices)])
            }
        }
    }

    fn build_prompt(turns: &[&Turn]) -> String {
        let mut body = String::from(
            "Segment the following conversation into coherent topics. \
             Respond with JSON matching the provided schema.\n\n",
        );
        for (i, turn) in turns.iter().enumerate() {
            let speaker = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => "system",
            };
            body.push_str(&format!("[{i}] {speaker}: {}\n", turn.content));
        }
        body
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "segments": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "topic": {"type": "string"},
                            "summary": {"type": "string"},
                            "key_points": {"type": "array", "items": {"type": "string"}},
                            "turn_indices": {"type": "array", "items": {"type": "integer"}},
                            "certainty": {"type": "number"},
                            "impact": {"type": "number"},
                            "participant_count": {"type": "integer"},
                            "message_count": {"type": "integer"},
                            "temporal_context": {"type": "string"}
                        },
                        "required": ["topic", "summary", "key_points", "turn_indices"]
                    }
                }
            },
            "required": ["segments"]
        })
    }

    fn parse_and_validate(response: &GenerationResponse) -> Result<Vec<TopicSegment>> {
        let value = match response {
            GenerationResponse::Structured(v) => v.clone(),
            GenerationResponse::Text(t) => serde_json::from_str(t)?,
        };
        let batch: RawSegmentBatch = serde_json::from_value(value)?;

        let mut segments = Vec::with_capacity(batch.segments.len());
        for raw in batch.segments {
            let segment = TopicSegment {
                segment_id: uuid::Uuid::new_v4(),
                topic: raw.topic,
                summary: raw.summary,
                key_points: raw.key_points,
                turn_indices: raw.turn_indices,
                certainty: raw.certainty,
                impact: raw.impact,
                participant_count: raw.participant_count,
                message_count: raw.message_count,
                temporal_context: raw.temporal_context,
            };
            match segment.validate() {
                Ok(()) => segments.push(segment),
                Err(e) => debug!(error = %e, "dropping invalid segment"),
            }
        }
        Ok(segments)
    }

    fn fallback(turns: &[&Turn], turn_indices: &[usize]) -> TopicSegment {
        let concatenated: String = turns
            .iter()
            .filter(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        TopicSegment::fallback(turn_indices.to_vec(), &concatenated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::storage::circuit_breaker::CircuitBreakerConfig;
    use crate::Error;

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse> {
            Err(Error::TransientBackendError("llm down".into()))
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 384])
        }
    }

    struct CountingLlm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for CountingLlm {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GenerationResponse::Structured(json!({
                "segments": [{
                    "topic": "dark mode preference",
                    "summary": "User expressed a strong preference for dark mode UI themes.",
                    "key_points": ["dark mode", "UI theme", "user preference"],
                    "turn_indices": [0, 1],
                    "certainty": 0.9,
                    "impact": 0.8,
                    "participant_count": 2,
                    "message_count": 2,
                    "temporal_context": "n/a"
                }]
            })))
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 384])
        }
    }

    fn turns(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| Turn::new("s1".to_string(), i as u64, Role::User, format!("turn {i}")))
            .collect()
    }

    #[tokio::test]
    async fn below_minimum_batch_returns_empty() {
        let segmenter = TopicSegmenter::new(
            Arc::new(FailingLlm),
            Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())),
        );
        let segments = segmenter.segment(&turns(5)).await.unwrap();
        assert!(segments.is_empty());
    }

    #[tokio::test]
    async fn llm_failure_falls_back_to_single_segment() {
        let segmenter = TopicSegmenter::new(
            Arc::new(FailingLlm),
            Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())),
        );
        let segments = segmenter.segment(&turns(12)).await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].certainty, segmentation::FALLBACK_CERTAINTY);
    }

    #[tokio::test]
    async fn one_llm_call_per_batch_regardless_of_turn_count() {
        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
        });
        let segmenter = TopicSegmenter::new(
            llm.clone(),
            Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())),
        );
        let segments = segmenter.segment(&turns(15)).await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oversized_batch_is_truncated_to_max() {
        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
        });
        let segmenter = TopicSegmenter::new(
            llm,
            Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())),
        );
        // 25 turns, max is 20 — should still produce exactly one call/result.
        let segments = segmenter.segment(&turns(25)).await.unwrap();
        assert_eq!(segments.len(), 1);
    }
}
