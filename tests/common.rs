//! Shared fixtures for the end-to-end scenario tests (spec.md §8 S1-S6).
//!
//! Each scenario builds its own tiers/engines over in-memory adapters
//! rather than going through `UnifiedMemorySystem`, so it can inject a
//! [`ScriptedLlm`] tailored to that scenario's segments/facts.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use memory_core::ciar::CiarScorer;
use memory_core::engines::{ConsolidationEngine, DistillationEngine, PromotionEngine};
use memory_core::llm::{GenerationRequest, GenerationResponse, LlmClient};
use memory_core::storage::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use memory_core::telemetry::Telemetry;
use memory_core::tiers::{ActiveContextTier, EpisodicMemoryTier, SemanticMemoryTier, WorkingMemoryTier};
use memory_core::types::{
    AccessStats, CiarComponents, CiarConfig, Fact, FactType, L1Config, L2Config, L3Config, L4Config,
};
use memory_core::{Error, Result};
use test_utils::{
    InMemoryFullTextStore, InMemoryGraphStore, InMemoryHotStore, InMemoryRelationalStore,
    InMemoryVectorStore,
};

/// Scripts LLM responses by prompt content: a `"Segment"`-prefixed
/// prompt gets the configured segment batch; an `"Extract"`-prefixed
/// prompt is matched against `facts_by_topic` (first entry whose topic
/// substring appears in the prompt, since `FactExtractor`'s prompt
/// embeds the segment's topic) and gets that segment's fact batch;
/// anything else echoes back (consolidation/distillation content
/// synthesis, where the test doesn't care about the exact text).
pub struct ScriptedLlm {
    pub segments: serde_json::Value,
    pub facts_by_topic: Vec<(&'static str, serde_json::Value)>,
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        if request.prompt.starts_with("Segment") {
            Ok(GenerationResponse::Structured(self.segments.clone()))
        } else if request.prompt.starts_with("Extract") {
            let facts = self
                .facts_by_topic
                .iter()
                .find(|(topic, _)| request.prompt.contains(topic))
                .map(|(_, facts)| facts.clone())
                .unwrap_or_else(|| serde_json::json!({"facts": []}));
            Ok(GenerationResponse::Structured(facts))
        } else {
            Ok(GenerationResponse::Text(request.prompt))
        }
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.1; 8])
    }
}

/// Always fails, for S6's circuit-breaker trip.
#[derive(Default)]
pub struct AlwaysFailingLlm;

#[async_trait]
impl LlmClient for AlwaysFailingLlm {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse> {
        Err(Error::TransientBackendError("scripted llm failure".into()))
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::TransientBackendError("scripted llm failure".into()))
    }
}

pub fn l1() -> Arc<ActiveContextTier> {
    Arc::new(ActiveContextTier::new(
        Arc::new(InMemoryHotStore::new()),
        Arc::new(InMemoryRelationalStore::new()),
        L1Config::default(),
    ))
}

pub fn l2() -> Arc<WorkingMemoryTier> {
    Arc::new(WorkingMemoryTier::new(
        Arc::new(InMemoryRelationalStore::new()),
        CiarScorer::new(CiarConfig::default()),
        L2Config::default(),
    ))
}

pub fn l3() -> Arc<EpisodicMemoryTier> {
    Arc::new(EpisodicMemoryTier::new(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(InMemoryGraphStore::new()),
        L3Config::default(),
    ))
}

pub fn l4() -> Arc<SemanticMemoryTier> {
    Arc::new(SemanticMemoryTier::new(Arc::new(InMemoryFullTextStore::new())))
}

pub fn breaker() -> Arc<CircuitBreaker> {
    Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default()))
}

#[allow(clippy::too_many_arguments)]
pub fn promotion_engine(
    l1: Arc<ActiveContextTier>,
    l2: Arc<WorkingMemoryTier>,
    llm: Arc<dyn LlmClient>,
    breaker: Arc<CircuitBreaker>,
    consolidation: Option<Arc<ConsolidationEngine>>,
) -> PromotionEngine {
    PromotionEngine::new(
        l1,
        l2,
        llm,
        breaker,
        CiarScorer::new(CiarConfig::default()),
        std::time::Duration::from_secs(3600),
        Arc::new(Telemetry::new()),
        consolidation,
    )
}

pub fn consolidation_engine(
    l2: Arc<WorkingMemoryTier>,
    l3: Arc<EpisodicMemoryTier>,
    llm: Arc<dyn LlmClient>,
    distillation: Option<Arc<DistillationEngine>>,
) -> ConsolidationEngine {
    ConsolidationEngine::new(
        l2,
        l3,
        llm,
        L3Config::default(),
        std::time::Duration::from_secs(3600),
        Arc::new(Telemetry::new()),
        distillation,
    )
}

pub fn distillation_engine(
    l4: Arc<SemanticMemoryTier>,
    llm: Arc<dyn LlmClient>,
    breaker: Arc<CircuitBreaker>,
) -> DistillationEngine {
    DistillationEngine::new(
        l4,
        llm,
        breaker,
        L4Config::default(),
        std::time::Duration::from_secs(3600),
        Arc::new(Telemetry::new()),
    )
}

/// A segment JSON object for [`ScriptedLlm::segments`], matching
/// `TopicSegmenter`'s expected schema.
pub fn segment_json(
    topic: &str,
    turn_indices: &[usize],
    certainty: f32,
    impact: f32,
) -> serde_json::Value {
    serde_json::json!({
        "topic": topic,
        "summary": format!("summary for {topic}"),
        "key_points": ["point a", "point b"],
        "turn_indices": turn_indices,
        "certainty": certainty,
        "impact": impact,
        "participant_count": 1,
        "message_count": turn_indices.len(),
        "temporal_context": "n/a",
    })
}

/// A fact JSON object, matching `FactExtractor`'s expected schema.
pub fn fact_json(content: &str, fact_type: &str) -> serde_json::Value {
    serde_json::json!({
        "content": content,
        "fact_type": fact_type,
        "fact_category": "test",
    })
}

/// Wraps fact objects into the `{"facts": [...]}` batch `FactExtractor`
/// expects as its structured response.
pub fn facts_batch(facts: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({ "facts": facts })
}

/// Wraps segment objects into the `{"segments": [...]}` batch
/// `TopicSegmenter` expects as its structured response.
pub fn segments_batch(segments: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({ "segments": segments })
}

/// Builds a fact directly (bypassing promotion) for tests that seed L2
/// with specific content/timestamps, e.g. to exercise consolidation
/// clustering.
pub fn seed_fact(
    session_id: &str,
    content: &str,
    fact_type: FactType,
    extracted_at: chrono::DateTime<chrono::Utc>,
) -> Fact {
    Fact {
        fact_id: uuid::Uuid::new_v4(),
        session_id: session_id.to_string(),
        content: content.to_string(),
        fact_type,
        fact_category: "test".to_string(),
        ciar: CiarComponents {
            certainty: 0.9,
            impact: 0.9,
            age_decay: 1.0,
            recency_boost: 1.0,
        },
        ciar_score: 0.81,
        access: AccessStats::default(),
        extracted_at,
        source_turn_ids: Vec::new(),
        topic_segment_id: None,
        topic_label: None,
        source_uri: None,
    }
}
